//! MCP protocol tests: JSON-RPC dispatch, the stdio loop and the HTTP router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use pubmed_mcp::client::PubMedClient;
use pubmed_mcp::config::Config;
use pubmed_mcp::server::McpServer;
use pubmed_mcp::server::stdio::serve;
use pubmed_mcp::server::transport::{
    JsonRpcRequest, SESSION_HEADER, codes, create_router, handle_request, parse_request,
};
use pubmed_mcp::tools::{ToolContext, register_all_tools};

/// Context whose client never gets a reachable server.
fn offline_context() -> ToolContext {
    let client = PubMedClient::new(Config::for_testing("http://127.0.0.1:9")).unwrap();
    ToolContext::new(Arc::new(client))
}

fn request(value: Value) -> JsonRpcRequest {
    serde_json::from_value(value).unwrap()
}

/// Run lines through the stdio loop and collect response lines.
async fn run_stdio_session(input: &str) -> Vec<Value> {
    let tools = register_all_tools();
    let ctx = offline_context();
    let mut output: Vec<u8> = Vec::new();

    serve(input.as_bytes(), &mut output, &tools, &ctx).await.unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_initialize_echoes_protocol_version() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {"protocolVersion": "2025-03-26", "capabilities": {}}
    }));
    let resp = handle_request(&req, &tools, &ctx).await.unwrap();
    let value = serde_json::to_value(&resp).unwrap();

    assert_eq!(value["jsonrpc"], "2.0");
    assert_eq!(value["id"], 1);
    assert_eq!(value["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(value["result"]["serverInfo"]["name"], "pubmed-mcp");
    assert!(value["result"]["capabilities"]["tools"].is_object());
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn test_initialize_default_protocol_version() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({"jsonrpc": "2.0", "id": "a", "method": "initialize"}));
    let value = serde_json::to_value(handle_request(&req, &tools, &ctx).await.unwrap()).unwrap();

    assert_eq!(value["id"], "a");
    assert_eq!(value["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn test_tools_list() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}));
    let value = serde_json::to_value(handle_request(&req, &tools, &ctx).await.unwrap()).unwrap();

    let listed = value["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = listed.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["search_pubmed", "fetch_paper_details"]);

    for tool in listed {
        assert_eq!(tool["inputSchema"]["type"], "object");
        assert!(!tool["description"].as_str().unwrap().is_empty());
    }
    assert_eq!(listed[1]["inputSchema"]["required"], json!(["pubmedIds"]));
}

#[tokio::test]
async fn test_notification_gets_no_response() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
    assert!(handle_request(&req, &tools, &ctx).await.is_none());

    // Unknown notifications are dropped silently too.
    let req = request(json!({"jsonrpc": "2.0", "method": "notifications/progress"}));
    assert!(handle_request(&req, &tools, &ctx).await.is_none());
}

#[tokio::test]
async fn test_unknown_method() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"}));
    let value = serde_json::to_value(handle_request(&req, &tools, &ctx).await.unwrap()).unwrap();

    assert_eq!(value["error"]["code"], codes::METHOD_NOT_FOUND);
    assert!(value["error"]["message"].as_str().unwrap().contains("resources/list"));
    assert!(value.get("result").is_none());
}

#[tokio::test]
async fn test_ping() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({"jsonrpc": "2.0", "id": 4, "method": "ping"}));
    let value = serde_json::to_value(handle_request(&req, &tools, &ctx).await.unwrap()).unwrap();

    assert_eq!(value["result"], json!({}));
}

#[tokio::test]
async fn test_tools_call_unknown_tool() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({
        "jsonrpc": "2.0", "id": 5, "method": "tools/call",
        "params": {"name": "get_citations", "arguments": {}}
    }));
    let value = serde_json::to_value(handle_request(&req, &tools, &ctx).await.unwrap()).unwrap();

    assert_eq!(value["error"]["code"], codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_tools_call_missing_name() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({
        "jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {}
    }));
    let value = serde_json::to_value(handle_request(&req, &tools, &ctx).await.unwrap()).unwrap();

    assert_eq!(value["error"]["code"], codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_tools_call_validation_error() {
    let tools = register_all_tools();
    let ctx = offline_context();

    let req = request(json!({
        "jsonrpc": "2.0", "id": 7, "method": "tools/call",
        "params": {"name": "search_pubmed", "arguments": {"keywords": []}}
    }));
    let value = serde_json::to_value(handle_request(&req, &tools, &ctx).await.unwrap()).unwrap();

    assert_eq!(value["id"], 7);
    assert_eq!(value["error"]["code"], codes::TOOL_ERROR);
    let message = value["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Tool error:"));
    assert!(message.contains("No search parameters provided"));
}

// =============================================================================
// Stdio Loop
// =============================================================================

#[tokio::test]
async fn test_stdio_session() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n",
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n",
    );

    let responses = run_stdio_session(input).await;

    assert_eq!(responses.len(), 2, "notification and blank line are not answered");
    assert_eq!(responses[0]["id"], 1);
    assert!(responses[0]["result"]["serverInfo"].is_object());
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_stdio_parse_error_keeps_serving() {
    let input = concat!(
        "this is not json\n",
        r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#,
        "\n",
    );

    let responses = run_stdio_session(input).await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], codes::PARSE_ERROR);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[1]["id"], 9);
}

#[tokio::test]
async fn test_stdio_null_id_is_answered() {
    let responses = run_stdio_session("{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"ping\"}\n").await;

    assert_eq!(responses.len(), 1, "an explicit null id is a request, not a notification");
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[0]["result"], json!({}));
}

#[tokio::test]
async fn test_stdio_request_without_method() {
    let responses = run_stdio_session("{\"jsonrpc\":\"2.0\",\"id\":7}\n[1,2]\n").await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["error"]["code"], codes::INVALID_REQUEST);
    assert_eq!(responses[0]["id"], 7);
    assert_eq!(responses[1]["error"]["code"], codes::INVALID_REQUEST);
    assert_eq!(responses[1]["id"], Value::Null);
}

#[test]
fn test_parse_request_distinguishes_missing_and_null_id() {
    let notification = parse_request(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
    assert!(notification.is_notification());

    let request = parse_request(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
    assert!(!request.is_notification());
    assert_eq!(request.id, Some(Value::Null));
}

#[tokio::test]
async fn test_stdio_last_line_without_newline() {
    let responses = run_stdio_session(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 1);
}

// =============================================================================
// HTTP Router
// =============================================================================

async fn post_mcp(body: &str, session: Option<&str>) -> (StatusCode, Option<String>, Vec<u8>) {
    let router = create_router(register_all_tools(), offline_context());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }

    let response = router.oneshot(builder.body(Body::from(body.to_string())).unwrap()).await.unwrap();

    let status = response.status();
    let session = response
        .headers()
        .get(SESSION_HEADER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, session, bytes.to_vec())
}

#[tokio::test]
async fn test_http_health() {
    let router = create_router(register_all_tools(), offline_context());

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["service"], "pubmed-mcp");
}

#[tokio::test]
async fn test_http_ready_counts_tools() {
    let router = create_router(register_all_tools(), offline_context());

    let response = router
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["tools"], 2);
}

#[tokio::test]
async fn test_http_initialize_issues_session() {
    let (status, session, body) =
        post_mcp(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#, None).await;

    assert_eq!(status, StatusCode::OK);
    let session = session.expect("initialize should set a session id");
    assert_eq!(session.len(), 36);

    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["id"], 1);
}

#[tokio::test]
async fn test_http_echoes_session() {
    let (status, session, body) =
        post_mcp(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, Some("abc-123")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(session.as_deref(), Some("abc-123"));
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["result"]["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_http_notification_accepted() {
    let (status, _, body) =
        post_mcp(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, None).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_http_invalid_request() {
    let (status, _, body) = post_mcp(r#"{"jsonrpc":"2.0","id":"x1"}"#, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["error"]["code"], codes::INVALID_REQUEST);
    assert_eq!(value["id"], "x1");
}

#[tokio::test]
async fn test_http_parse_error() {
    let (status, _, body) = post_mcp("{oops", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["error"]["code"], codes::PARSE_ERROR);
}

// =============================================================================
// Server
// =============================================================================

#[test]
fn test_server_registers_tools() {
    let client = PubMedClient::new(Config::for_testing("http://127.0.0.1:9")).unwrap();
    let server = McpServer::new(client);

    assert_eq!(format!("{server:?}"), "McpServer { tools: 2 }");
}
