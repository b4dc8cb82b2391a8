//! Simulated traffic tests

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use reqwest::Method;
use serde_json::{json, Value};

use mock_simulator::config::SimulatorConfig;

use super::common::{id_of, invoice_route, TestServer};

#[tokio::test]
async fn test_serves_configured_response() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    server.create_route(id_of(&mock), invoice_route()).await;

    let response = server.simulate(Method::GET, "payments-x1", "/invoice").await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), "{\"id\":1}");

    let logs = server.logs(id_of(&mock)).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["path"], "/invoice");
    assert_eq!(logs[0]["method"], "GET");
    assert_eq!(logs[0]["statusCode"], 200);
    assert_eq!(logs[0]["isChaosTriggered"], false);
}

#[tokio::test]
async fn test_trailing_slash_and_query_are_ignored() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    server.create_route(id_of(&mock), invoice_route()).await;

    let slash = server.simulate(Method::GET, "payments-x1", "/invoice/").await;
    assert_eq!(slash.status(), 200);

    let query = server
        .simulate(Method::GET, "payments-x1", "/invoice?expand=lines")
        .await;
    assert_eq!(query.status(), 200);
}

#[tokio::test]
async fn test_method_and_path_must_match() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    server.create_route(id_of(&mock), invoice_route()).await;

    let wrong_method = server.simulate(Method::POST, "payments-x1", "/invoice").await;
    assert_eq!(wrong_method.status(), 404);

    let wrong_path = server.simulate(Method::GET, "payments-x1", "/invoices").await;
    assert_eq!(wrong_path.status(), 404);
    let body: Value = wrong_path.json().await.unwrap();
    assert_eq!(body["error"]["type"], "route_not_found");
}

#[tokio::test]
async fn test_unknown_prefix_is_not_found() {
    let server = TestServer::spawn().await;

    let response = server.simulate(Method::GET, "nobody", "/invoice").await;

    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "server_not_found");
}

#[tokio::test]
async fn test_disabled_route_stops_matching() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    let route = server.create_route(id_of(&mock), invoice_route()).await;
    let route_path = format!("/api/mocks/routes/{}", id_of(&route));

    let disabled = server.put(&route_path, json!({ "isEnabled": false })).await;
    assert_eq!(disabled.status(), 200);
    let miss = server.simulate(Method::GET, "payments-x1", "/invoice").await;
    assert_eq!(miss.status(), 404);

    server.put(&route_path, json!({ "isEnabled": true })).await;
    let hit = server.simulate(Method::GET, "payments-x1", "/invoice").await;
    assert_eq!(hit.status(), 200);
    assert_eq!(hit.text().await.unwrap(), "{\"id\":1}");
}

#[tokio::test]
async fn test_route_changes_apply_to_next_request() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    let route = server.create_route(id_of(&mock), invoice_route()).await;

    server
        .put(
            &format!("/api/mocks/routes/{}", id_of(&route)),
            json!({ "statusCode": 202, "responseBody": "queued" }),
        )
        .await;

    let response = server.simulate(Method::GET, "payments-x1", "/invoice").await;
    assert_eq!(response.status(), 202);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain"
    );
    assert_eq!(response.text().await.unwrap(), "queued");
}

#[tokio::test]
async fn test_custom_headers_are_returned() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Feeds", "feeds").await;
    server
        .create_route(
            id_of(&mock),
            json!({
                "method": "GET",
                "path": "/rss",
                "responseBody": "<rss/>",
                "responseHeaders": "{\"Content-Type\":\"application/rss+xml\",\"X-Feed\":\"main\"}"
            }),
        )
        .await;

    let response = server.simulate(Method::GET, "feeds", "/rss").await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/rss+xml"
    );
    assert_eq!(response.headers().get("x-feed").unwrap(), "main");
    assert!(response.headers().get("x-request-id").is_none());
}

#[tokio::test]
async fn test_chaos_injects_generic_failure() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Flaky", "flaky").await;
    let mut route = invoice_route();
    route["chaosEnabled"] = json!(true);
    route["failureRate"] = json!(1.0);
    server.create_route(id_of(&mock), route).await;

    let response = server.simulate(Method::GET, "flaky", "/invoice").await;

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "chaos_injected");
    assert_eq!(body["error"]["message"], "Simulated server error");

    let logs = server.logs(id_of(&mock)).await;
    assert_eq!(logs[0]["statusCode"], 500);
    assert_eq!(logs[0]["isChaosTriggered"], true);
}

#[tokio::test]
async fn test_global_chaos_switch() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Flaky", "flaky").await;
    let mut route = invoice_route();
    route["chaosEnabled"] = json!(true);
    route["failureRate"] = json!(1.0);
    server.create_route(id_of(&mock), route).await;

    server.post_empty("/admin/chaos/disable").await;
    let calm = server.simulate(Method::GET, "flaky", "/invoice").await;
    assert_eq!(calm.status(), 200);

    server.post_empty("/admin/chaos/enable").await;
    let failing = server.simulate(Method::GET, "flaky", "/invoice").await;
    assert_eq!(failing.status(), 500);
}

#[tokio::test]
async fn test_zero_failure_rate_never_fails() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Stable", "stable").await;
    let mut route = invoice_route();
    route["chaosEnabled"] = json!(true);
    route["failureRate"] = json!(0.0);
    server.create_route(id_of(&mock), route).await;

    for _ in 0..50 {
        let response = server.simulate(Method::GET, "stable", "/invoice").await;
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn test_delay_does_not_block_other_requests() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Slow", "slow").await;
    let mut slow = invoice_route();
    slow["path"] = json!("/slow");
    slow["delayMs"] = json!(500);
    server.create_route(id_of(&mock), slow).await;
    server.create_route(id_of(&mock), invoice_route()).await;

    let client = server.client.clone();
    let slow_url = server.mock_url("slow", "/slow");
    let slow_request = tokio::spawn(async move {
        let start = Instant::now();
        let response = client.get(slow_url).send().await.unwrap();
        (response.status().as_u16(), start.elapsed())
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    let fast_start = Instant::now();
    let fast = (0..10).map(|_| server.simulate(Method::GET, "slow", "/invoice"));
    for response in join_all(fast).await {
        assert_eq!(response.status(), 200);
    }
    assert!(fast_start.elapsed() < Duration::from_millis(400));

    let (status, elapsed) = slow_request.await.unwrap();
    assert_eq!(status, 200);
    assert!(elapsed >= Duration::from_millis(500));
}

#[tokio::test]
async fn test_logs_are_newest_first() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    server.create_route(id_of(&mock), invoice_route()).await;

    server.simulate(Method::GET, "payments-x1", "/invoice").await;
    server.simulate(Method::GET, "payments-x1", "/missing").await;
    server.simulate(Method::DELETE, "payments-x1", "/invoice").await;

    let logs = server.logs(id_of(&mock)).await;
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0]["method"], "DELETE");
    assert_eq!(logs[0]["statusCode"], 404);
    assert_eq!(logs[1]["path"], "/missing");
    assert_eq!(logs[2]["statusCode"], 200);
    assert!(logs[2]["routeId"].is_u64());
    assert!(logs[1]["routeId"].is_null());
}

#[tokio::test]
async fn test_payments_scenario() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    let route = server.create_route(id_of(&mock), invoice_route()).await;
    let route_path = format!("/api/mocks/routes/{}", id_of(&route));

    let ok = server.simulate(Method::GET, "payments-x1", "/invoice").await;
    assert_eq!(ok.status(), 200);
    assert_eq!(ok.text().await.unwrap(), "{\"id\":1}");

    server
        .put(&route_path, json!({ "mockServerId": id_of(&mock), "isEnabled": false }))
        .await;
    let disabled = server.simulate(Method::GET, "payments-x1", "/invoice").await;
    assert_eq!(disabled.status(), 404);

    server
        .put(
            &route_path,
            json!({ "isEnabled": true, "chaosEnabled": true, "failureRate": 1.0 }),
        )
        .await;
    let chaos = server.simulate(Method::GET, "payments-x1", "/invoice").await;
    assert_eq!(chaos.status(), 500);

    let logs = server.logs(id_of(&mock)).await;
    let statuses: Vec<_> = logs.iter().map(|e| e["statusCode"].as_u64().unwrap()).collect();
    let chaos_flags: Vec<_> = logs.iter().map(|e| e["isChaosTriggered"].as_bool().unwrap()).collect();
    assert_eq!(statuses, vec![500, 404, 200]);
    assert_eq!(chaos_flags, vec![true, false, false]);
}

fn header_names(response: &reqwest::Response) -> Vec<String> {
    let mut names: Vec<String> = response
        .headers()
        .keys()
        .map(|name| name.as_str().to_string())
        .filter(|name| name != "date" && name != "content-length")
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_simulated_headers_are_exactly_the_routes() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Headers", "headers").await;
    let mut route = invoice_route();
    route["responseHeaders"] = json!({ "X-A": "1" });
    server.create_route(id_of(&mock), route).await;

    let response = server
        .client
        .get(server.mock_url("headers", "/invoice"))
        .header("origin", "https://dashboard.example")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(header_names(&response), vec!["content-type", "x-a"]);
}

#[tokio::test]
async fn test_chaos_response_carries_no_extra_headers() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Flaky", "flaky").await;
    let mut route = invoice_route();
    route["responseHeaders"] = json!({ "X-A": "1" });
    route["chaosEnabled"] = json!(true);
    route["failureRate"] = json!(1.0);
    server.create_route(id_of(&mock), route).await;

    let response = server
        .client
        .get(server.mock_url("flaky", "/invoice"))
        .header("origin", "https://dashboard.example")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(header_names(&response), vec!["content-type"]);
}

#[tokio::test]
async fn test_options_route_answers_preflight() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Preflight", "preflight").await;
    server
        .create_route(
            id_of(&mock),
            json!({ "method": "OPTIONS", "path": "/invoice", "statusCode": 204 }),
        )
        .await;

    let response = server
        .client
        .request(Method::OPTIONS, server.mock_url("preflight", "/invoice"))
        .header("origin", "https://dashboard.example")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert!(response.headers().get("access-control-allow-origin").is_none());

    let logs = server.logs(id_of(&mock)).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["method"], "OPTIONS");
    assert_eq!(logs[0]["statusCode"], 204);
}

#[tokio::test]
async fn test_large_body_reaches_route() {
    let mut config = SimulatorConfig::default();
    config.server.request_logging = false;
    config.server.max_body_bytes = 1024;
    let server = TestServer::spawn_with_config(config).await;
    let mock = server.create_server("Uploads", "uploads").await;
    server
        .create_route(
            id_of(&mock),
            json!({ "method": "POST", "path": "/upload", "statusCode": 202, "responseBody": "stored" }),
        )
        .await;

    let response = server
        .client
        .post(server.mock_url("uploads", "/upload"))
        .body(vec![b'x'; 4096])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    assert_eq!(response.text().await.unwrap(), "stored");

    let logs = server.logs(id_of(&mock)).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["statusCode"], 202);

    // The management API keeps its limit
    let oversized = server
        .post(
            "/api/mocks/routes/create",
            json!({
                "mockServerId": id_of(&mock),
                "method": "GET",
                "path": "/big",
                "responseBody": "y".repeat(4096)
            }),
        )
        .await;
    assert_eq!(oversized.status(), 400);
}

#[tokio::test]
async fn test_bare_simulator_base_is_logged() {
    let server = TestServer::spawn().await;

    for path in ["/api/mock/simulator", "/api/mock/simulator/"] {
        let response = server.get(path).await;
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["type"], "server_not_found");
    }

    let stats: Value = server.get("/admin/stats").await.json().await.unwrap();
    assert_eq!(stats["engine"]["server_not_found"], 2);
    assert_eq!(stats["traffic_log_entries"], 2);
}
