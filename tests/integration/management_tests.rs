//! Management API tests

use serde_json::{json, Value};

use super::common::{id_of, invoice_route, TestServer};

#[tokio::test]
async fn test_create_server_generates_prefix() {
    let server = TestServer::spawn().await;

    let response = server
        .post(
            "/api/mocks/servers/create",
            json!({ "name": "Payments API", "workspaceId": 7 }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.unwrap();
    let prefix = created["pathPrefix"].as_str().unwrap();
    assert!(prefix.starts_with("payments-api-"));
    assert_eq!(created["workspaceId"], 7);

    let fetched: Value = server
        .get(&format!("/api/mocks/servers/{}", id_of(&created)))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_duplicate_prefix_conflicts() {
    let server = TestServer::spawn().await;
    server.create_server("Payments", "payments-x1").await;

    let response = server
        .post(
            "/api/mocks/servers/create",
            json!({ "name": "Other", "workspaceId": 2, "pathPrefix": "payments-x1" }),
        )
        .await;

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "conflict_error");
}

#[tokio::test]
async fn test_list_servers_by_workspace() {
    let server = TestServer::spawn().await;
    server.create_server("A", "ws-a").await;
    server.create_server("B", "ws-b").await;
    server
        .post(
            "/api/mocks/servers/create",
            json!({ "name": "Elsewhere", "workspaceId": 2, "pathPrefix": "elsewhere" }),
        )
        .await;

    let servers: Vec<Value> = server
        .get("/api/mocks/servers/workspace/1")
        .await
        .json()
        .await
        .unwrap();

    let names: Vec<_> = servers.iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[tokio::test]
async fn test_route_validation_rejects_bad_input() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;

    let cases = [
        json!({ "mockServerId": id_of(&mock), "method": "GET", "path": "/a", "statusCode": 42 }),
        json!({ "mockServerId": id_of(&mock), "method": "GET", "path": "/a", "delayMs": -1 }),
        json!({ "mockServerId": id_of(&mock), "method": "BREW", "path": "/a" }),
        json!({ "mockServerId": id_of(&mock), "method": "GET", "path": "/a", "failureRate": "lots" }),
        json!({ "method": "GET", "path": "/a" }),
        json!({ "mockServerId": id_of(&mock), "method": "GET", "path": "/café" }),
        json!({ "mockServerId": id_of(&mock), "method": "GET", "path": "/caf%C3%A9" }),
    ];

    for case in cases {
        let response = server.post("/api/mocks/routes/create", case.clone()).await;
        assert_eq!(response.status(), 400, "accepted {}", case);
    }

    let routes: Vec<Value> = server
        .get(&format!("/api/mocks/routes/server/{}", id_of(&mock)))
        .await
        .json()
        .await
        .unwrap();
    assert!(routes.is_empty());
}

#[tokio::test]
async fn test_route_for_missing_server_is_not_found() {
    let server = TestServer::spawn().await;

    let mut route = invoice_route();
    route["mockServerId"] = json!(999);
    let response = server.post("/api/mocks/routes/create", route).await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_failure_rate_is_clamped_on_save() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    let mut route = invoice_route();
    route["chaosEnabled"] = json!(true);
    route["failureRate"] = json!(3.5);

    let created = server.create_route(id_of(&mock), route).await;

    assert_eq!(created["failureRate"], 1.0);
}

#[tokio::test]
async fn test_route_crud() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    let created = server.create_route(id_of(&mock), invoice_route()).await;
    let path = format!("/api/mocks/routes/{}", id_of(&created));

    assert_eq!(created["method"], "GET");
    assert_eq!(created["path"], "/invoice");
    assert_eq!(created["mockServerId"], id_of(&mock));

    let updated: Value = server
        .put(&path, json!({ "delayMs": 250, "responseHeaders": { "X-Mode": "slow" } }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(updated["delayMs"], 250);
    assert_eq!(updated["responseBody"], "{\"id\":1}");
    assert_eq!(updated["responseHeaders"], "{\"X-Mode\":\"slow\"}");

    let fetched: Value = server.get(&path).await.json().await.unwrap();
    assert_eq!(fetched, updated);

    assert_eq!(server.delete(&path).await.status(), 204);
    assert_eq!(server.get(&path).await.status(), 404);
    assert_eq!(server.delete(&path).await.status(), 404);
}

#[tokio::test]
async fn test_invalid_update_keeps_route() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    let created = server.create_route(id_of(&mock), invoice_route()).await;
    let path = format!("/api/mocks/routes/{}", id_of(&created));

    let response = server
        .put(&path, json!({ "statusCode": 700, "responseBody": "changed" }))
        .await;
    assert_eq!(response.status(), 400);

    let fetched: Value = server.get(&path).await.json().await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_delete_server_cascades() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    let route = server.create_route(id_of(&mock), invoice_route()).await;

    server
        .simulate(reqwest::Method::GET, "payments-x1", "/invoice")
        .await;

    let response = server
        .delete(&format!("/api/mocks/servers/{}", id_of(&mock)))
        .await;
    assert_eq!(response.status(), 204);

    assert_eq!(
        server
            .get(&format!("/api/mocks/routes/{}", id_of(&route)))
            .await
            .status(),
        404
    );
    assert_eq!(
        server
            .get(&format!("/api/mocks/routes/server/{}", id_of(&mock)))
            .await
            .status(),
        404
    );

    let miss = server
        .simulate(reqwest::Method::GET, "payments-x1", "/invoice")
        .await;
    assert_eq!(miss.status(), 404);

    // History outlives the server
    let logs = server.logs(id_of(&mock)).await;
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn test_prefix_is_reusable_after_delete() {
    let server = TestServer::spawn().await;
    let mock = server.create_server("Payments", "payments-x1").await;
    server
        .delete(&format!("/api/mocks/servers/{}", id_of(&mock)))
        .await;

    let again = server.create_server("Payments v2", "payments-x1").await;
    assert_ne!(id_of(&again), id_of(&mock));
}

#[tokio::test]
async fn test_logs_for_unknown_server_are_empty() {
    let server = TestServer::spawn().await;

    let logs = server.logs(4242).await;

    assert!(logs.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/api/mocks/routes/create"))
        .header("content-type", "application/json")
        .body("{\"method\":")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
}
