//! CLI Command Implementations
//!
//! Implementations for all CLI subcommands.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::sync::Semaphore;
use url::Url;

use crate::config::MockServerSeed;
use crate::latency::SampleSummary;
use crate::types::RouteInput;
use crate::{SimulatorConfig, VERSION};

use super::{
    Cli, Commands, ConfigAction, ConfigCommand, HealthCommand, ProbeCommand, ServeCommand,
};

/// Execute the CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Load base configuration
    let mut config = if let Some(path) = &cli.config {
        SimulatorConfig::from_file(path)?
    } else {
        SimulatorConfig::from_env()?
    };

    // Apply global settings
    config.telemetry.log_level = cli.log_level.clone();
    config.telemetry.json_logs = cli.json_logs;

    match cli.command {
        Commands::Serve(cmd) => execute_serve(cmd, config, cli.quiet).await,
        Commands::Config(cmd) => execute_config(cmd, config),
        Commands::Health(cmd) => execute_health(cmd).await,
        Commands::Probe(cmd) => execute_probe(cmd).await,
        Commands::Version => execute_version(),
    }
}

/// Fold serve flags into the loaded configuration
pub fn apply_serve_overrides(cmd: &ServeCommand, config: &mut SimulatorConfig) {
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    if let Some(host) = &cmd.host {
        config.server.host = host.clone();
    }
    if cmd.no_latency {
        config.latency.enabled = false;
    }
    if cmd.no_chaos {
        config.chaos.enabled = false;
    }
    if let Some(timeout) = cmd.timeout {
        config.server.request_timeout = timeout;
    }
    if let Some(drain) = cmd.drain_period {
        config.server.drain_timeout = drain;
    }
}

/// Execute the serve command
async fn execute_serve(cmd: ServeCommand, mut config: SimulatorConfig, quiet: bool) -> Result<()> {
    apply_serve_overrides(&cmd, &mut config);

    config.validate().context("Configuration validation failed")?;

    if !quiet {
        print_banner(&config);
    }

    crate::run_server(config).await
}

/// Execute the config command
fn execute_config(cmd: ConfigCommand, config: SimulatorConfig) -> Result<()> {
    match cmd.action {
        ConfigAction::Show { format } => {
            println!("{}", render_config(&config, &format)?);
            Ok(())
        }

        ConfigAction::Validate { file } => {
            let config = SimulatorConfig::from_file(&file)?;
            config.validate()?;
            let routes: usize = config.mocks.iter().map(|m| m.routes.len()).sum();
            println!("Configuration at {:?} is valid", file);
            println!("  Mock servers: {}", config.mocks.len());
            println!("  Routes:       {}", routes);
            println!("  Latency:      {}", if config.latency.enabled { "enabled" } else { "disabled" });
            println!("  Chaos:        {}", if config.chaos.enabled { "enabled" } else { "disabled" });
            Ok(())
        }

        ConfigAction::Init { output, with_sample, force } => {
            if output.exists() && !force {
                bail!("File {:?} already exists. Use --force to overwrite.", output);
            }

            let mut config = SimulatorConfig::default();
            if with_sample {
                config.mocks.push(sample_mock_server());
            }

            let rendered = render_config(&config, format_for_path(&output))?;
            std::fs::write(&output, rendered)
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!("Created configuration file: {:?}", output);
            Ok(())
        }

        ConfigAction::Env => {
            println!("Environment Variable Mappings:");
            println!();
            println!("  {:<36} {}", "MOCK_SIMULATOR_CONFIG", "Configuration file path");
            println!("  {:<36} {}", "MOCK_SIMULATOR_HOST", "Server host (default: 0.0.0.0)");
            println!("  {:<36} {}", "MOCK_SIMULATOR_PORT", "Server port (default: 8080)");
            println!("  {:<36} {}", "MOCK_SIMULATOR_LATENCY_ENABLED", "Honor per-route delays");
            println!("  {:<36} {}", "MOCK_SIMULATOR_CHAOS_ENABLED", "Allow chaos injection");
            println!("  {:<36} {}", "MOCK_SIMULATOR_LOG_LEVEL", "Log level (trace/debug/info/warn/error)");
            println!("  {:<36} {}", "MOCK_SIMULATOR_JSON_LOGS", "Enable JSON log format");
            Ok(())
        }
    }
}

/// Serialize a configuration as yaml, toml or json
pub fn render_config(config: &SimulatorConfig, format: &str) -> Result<String> {
    Ok(match format {
        "toml" => toml::to_string_pretty(config)?,
        "json" => serde_json::to_string_pretty(config)?,
        "yaml" | "yml" => serde_yaml::to_string(config)?,
        other => bail!("Unsupported format '{}'", other),
    })
}

fn format_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => "toml",
        Some("json") => "json",
        _ => "yaml",
    }
}

fn sample_mock_server() -> MockServerSeed {
    MockServerSeed {
        name: "Payments".to_string(),
        workspace_id: 1,
        path_prefix: Some("payments-x1".to_string()),
        routes: vec![
            RouteInput::new("GET", "/invoice")
                .body(r#"{"id":"inv_1","amount":4200}"#),
            RouteInput::new("POST", "/charge")
                .status(201)
                .body(r#"{"status":"accepted"}"#)
                .delay(250),
            RouteInput::new("GET", "/flaky")
                .body("ok")
                .header("Content-Type", "text/plain")
                .chaos(0.3),
        ],
    }
}

/// Execute the health command
async fn execute_health(cmd: HealthCommand) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cmd.timeout))
        .build()?;

    let endpoint = if cmd.ready { "ready" } else { "health" };
    let base = Url::parse(&cmd.url).with_context(|| format!("Invalid URL '{}'", cmd.url))?;
    let url = base.join(endpoint)?.to_string();
    let start = Instant::now();

    match client.get(&url).send().await {
        Ok(response) => {
            let latency = start.elapsed();
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();

            match cmd.format.as_str() {
                "json" => {
                    let result = serde_json::json!({
                        "url": url,
                        "status": status.as_u16(),
                        "latency_ms": latency.as_millis(),
                        "response": body,
                    });
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                _ => {
                    let mark = if status.is_success() { "✓" } else { "✗" };
                    println!("{} {} - Status: {} - Latency: {:?}", mark, url, status.as_u16(), latency);
                    if let Some(health_status) = body.get("status") {
                        println!("  Health: {}", health_status);
                    }
                }
            }

            if status.is_success() {
                Ok(())
            } else {
                bail!("Health check failed with status {}", status)
            }
        }
        Err(e) => {
            match cmd.format.as_str() {
                "json" => {
                    let result = serde_json::json!({ "url": url, "error": e.to_string() });
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                _ => println!("✗ {} - Error: {}", url, e),
            }
            bail!("Health check failed: {}", e)
        }
    }
}

/// Outcome of a single probe request
#[derive(Debug, Clone, Copy)]
pub enum ProbeResult {
    Response { status: u16, latency: Duration },
    Failed,
}

/// Aggregated probe results
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub requests: usize,
    pub failed: usize,
    pub status_counts: BTreeMap<u16, usize>,
    pub latency: SampleSummary,
    pub duration_secs: f64,
}

impl ProbeReport {
    pub fn from_results(results: &[ProbeResult], elapsed: Duration) -> Self {
        let mut status_counts = BTreeMap::new();
        let mut latencies = Vec::with_capacity(results.len());
        let mut failed = 0;

        for result in results {
            match result {
                ProbeResult::Response { status, latency } => {
                    *status_counts.entry(*status).or_insert(0) += 1;
                    latencies.push(latency.as_secs_f64() * 1000.0);
                }
                ProbeResult::Failed => failed += 1,
            }
        }

        Self {
            requests: results.len(),
            failed,
            status_counts,
            latency: SampleSummary::from_samples(&latencies),
            duration_secs: elapsed.as_secs_f64(),
        }
    }

    /// Share of answered requests that came back with this status
    pub fn status_share(&self, status: u16) -> f64 {
        let answered: usize = self.status_counts.values().sum();
        if answered == 0 {
            return 0.0;
        }
        self.status_counts.get(&status).copied().unwrap_or(0) as f64 / answered as f64
    }
}

/// Execute the probe command
async fn execute_probe(cmd: ProbeCommand) -> Result<()> {
    if cmd.concurrency == 0 {
        bail!("Concurrency must be at least 1");
    }

    let target = Url::parse(&cmd.url).with_context(|| format!("Invalid URL '{}'", cmd.url))?;
    if !matches!(target.scheme(), "http" | "https") {
        bail!("Probe target must be an http(s) URL");
    }

    let method = reqwest::Method::from_bytes(cmd.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid method '{}'", cmd.method))?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cmd.timeout))
        .build()?;

    eprintln!(
        "Probing {} {}: {} requests, {} concurrent",
        method, target, cmd.requests, cmd.concurrency
    );

    let semaphore = Arc::new(Semaphore::new(cmd.concurrency));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(cmd.requests);
    for _ in 0..cmd.requests {
        let client = client.clone();
        let semaphore = semaphore.clone();
        let method = method.clone();
        let url = target.clone();

        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return ProbeResult::Failed;
            };
            let req_start = Instant::now();

            match client.request(method, url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let _ = response.bytes().await;
                    ProbeResult::Response {
                        status,
                        latency: req_start.elapsed(),
                    }
                }
                Err(_) => ProbeResult::Failed,
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }

    let report = ProbeReport::from_results(&results, start.elapsed());

    match cmd.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!();
            println!("Probe Results");
            println!("=============");
            println!("Requests:     {}", report.requests);
            println!("Failed:       {}", report.failed);
            println!("Duration:     {:.2}s", report.duration_secs);
            println!();
            println!("Status codes:");
            for (status, count) in &report.status_counts {
                println!("  {}:        {} ({:.1}%)", status, count, report.status_share(*status) * 100.0);
            }
            println!();
            println!("Latency:");
            println!("  Min:        {:.1}ms", report.latency.min_ms);
            println!("  Mean:       {:.1}ms", report.latency.mean_ms);
            println!("  P50:        {:.1}ms", report.latency.p50_ms);
            println!("  P95:        {:.1}ms", report.latency.p95_ms);
            println!("  P99:        {:.1}ms", report.latency.p99_ms);
            println!("  Max:        {:.1}ms", report.latency.max_ms);
        }
    }

    Ok(())
}

fn execute_version() -> Result<()> {
    println!("mock-simulator {}", VERSION);
    println!();
    println!("Build Information:");
    println!("  Version:       {}", VERSION);
    println!("  Rust Version:  {}", env!("CARGO_PKG_RUST_VERSION"));
    Ok(())
}

fn print_banner(config: &SimulatorConfig) {
    let base = format!("http://{}:{}", config.server.host, config.server.port);

    println!();
    println!("Mock Simulator v{}", VERSION);
    println!();
    println!("Configuration:");
    println!("  • Server:    {}:{}", config.server.host, config.server.port);
    println!("  • Mocks:     {} configured", config.mocks.len());
    println!("  • Latency:   {}", if config.latency.enabled { "enabled" } else { "disabled" });
    println!("  • Chaos:     {}", if config.chaos.enabled { "enabled" } else { "disabled" });
    println!();
    println!("Endpoints:");
    println!("  • Simulator: {}/api/mock/simulator/{{prefix}}/{{path}}", base);
    println!("  • Servers:   {}/api/mocks/servers", base);
    println!("  • Routes:    {}/api/mocks/routes", base);
    println!("  • Logs:      {}/api/logs/server/{{id}}", base);
    println!("  • Health:    {}/health", base);
    println!("  • Metrics:   {}/metrics", base);
    println!();
}
