//! Admin, health and metrics endpoint tests

use reqwest::Method;
use serde_json::Value;

use mock_simulator::config::{MockServerSeed, SimulatorConfig};
use mock_simulator::types::RouteInput;

use super::common::{id_of, invoice_route, TestServer};

#[tokio::test]
async fn test_health_and_request_id() {
    let server = TestServer::spawn().await;

    let response = server.get("/health").await;

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert!(body["checks"]["engine"].is_object());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/version"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me");
}

#[tokio::test]
async fn test_stats_count_outcomes() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    server.create_route(id_of(&mock), invoice_route()).await;

    server.simulate(Method::GET, "payments-x1", "/invoice").await;
    server.simulate(Method::GET, "payments-x1", "/nothing").await;
    server.simulate(Method::GET, "nobody", "/invoice").await;

    let stats: Value = server.get("/admin/stats").await.json().await.unwrap();
    assert_eq!(stats["engine"]["total_requests"], 3);
    assert_eq!(stats["engine"]["served"], 1);
    assert_eq!(stats["engine"]["route_not_found"], 1);
    assert_eq!(stats["engine"]["server_not_found"], 1);
    assert_eq!(stats["mock_servers"], 1);
    assert_eq!(stats["mock_routes"], 1);
    assert_eq!(stats["traffic_log_entries"], 3);

    assert_eq!(server.post_empty("/admin/stats/reset").await.status(), 204);
    let stats: Value = server.get("/admin/stats").await.json().await.unwrap();
    assert_eq!(stats["engine"]["total_requests"], 0);
}

#[tokio::test]
async fn test_chaos_status_reflects_switch() {
    let server = TestServer::spawn().await;

    let status: Value = server.get("/admin/chaos/status").await.json().await.unwrap();
    assert_eq!(status["enabled"], true);

    let status: Value = server
        .post_empty("/admin/chaos/disable")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(status["enabled"], false);
    assert!(!server.state.engine.chaos_policy().is_enabled());
}

#[tokio::test]
async fn test_metrics_export() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    server.create_route(id_of(&mock), invoice_route()).await;
    server.simulate(Method::GET, "payments-x1", "/invoice").await;

    let response = server.get("/metrics").await;
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();

    assert!(text.contains("mock_simulator_requests_total"));
    assert!(text.contains("mock_simulator_mock_servers 1"));
    assert!(text.contains("mock_simulator_mock_routes 1"));
}

#[tokio::test]
async fn test_configured_mocks_are_served() {
    let mut config = SimulatorConfig::default();
    config.mocks.push(MockServerSeed {
        name: "Seeded".into(),
        workspace_id: 3,
        path_prefix: Some("seeded".into()),
        routes: vec![RouteInput::new("GET", "/ping").body("pong")],
    });
    let server = TestServer::spawn_with_config(config).await;

    let response = server.simulate(Method::GET, "seeded", "/ping").await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_drain_rejects_new_requests() {
    let server = TestServer::spawn().await;

    let status: Value = server.post_empty("/admin/drain").await.json().await.unwrap();
    assert_eq!(status["draining"], true);

    let ready = server.get("/ready").await;
    assert_eq!(ready.status(), 503);

    let simulated = server.simulate(Method::GET, "payments-x1", "/invoice").await;
    assert_eq!(simulated.status(), 503);
}

#[tokio::test]
async fn test_cors_applies_to_management_api() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/api/mocks/servers/workspace/1"))
        .header("origin", "https://dashboard.example")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
