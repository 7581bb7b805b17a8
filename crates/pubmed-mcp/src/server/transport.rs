//! JSON-RPC 2.0 message handling and the HTTP transport.
//!
//! The dispatch in [`handle_request`] is shared by the stdio loop and the
//! `POST /mcp` endpoint.

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::tools::{McpTool, ToolContext};

/// Protocol version used when the client does not send one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Session header name for the HTTP transport.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// JSON-RPC error codes.
pub mod codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON is not a valid request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Tool execution failed.
    pub const TOOL_ERROR: i32 = -32000;
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    /// `None` when the member is absent; an explicit `null` is `Some(Null)`.
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Requests without an id member are notifications and get no response.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Parse one JSON-RPC message.
///
/// Malformed JSON yields a `-32700` error with a null id. Well-formed JSON
/// that is not a request object yields `-32600`, echoing its id if present.
pub fn parse_request(text: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        JsonRpcResponse::error(
            Some(serde_json::Value::Null),
            codes::PARSE_ERROR,
            format!("Parse error: {e}"),
        )
    })?;

    let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);

    serde_json::from_value(value).map_err(|e| {
        JsonRpcResponse::error(Some(id), codes::INVALID_REQUEST, format!("Invalid request: {e}"))
    })
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError { code, message: message.into(), data: None }),
            id,
        }
    }
}

/// MCP tool info for tools/list response.
#[derive(Debug, Serialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Dispatch one request.
///
/// Returns `None` for notifications, which must not be answered.
pub async fn handle_request(
    req: &JsonRpcRequest,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> Option<JsonRpcResponse> {
    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(req.id.clone(), handle_initialize(&req.params)),
        "notifications/initialized" | "initialized" | "notifications/cancelled" => {
            JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))
        }
        "tools/list" => handle_tools_list(req.id.clone(), tools),
        "tools/call" => handle_tools_call(req.id.clone(), &req.params, tools, ctx).await,
        "ping" => JsonRpcResponse::success(req.id.clone(), serde_json::json!({})),
        _ => JsonRpcResponse::error(
            req.id.clone(),
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    if req.is_notification() {
        tracing::debug!(method = %req.method, "Notification handled");
        return None;
    }

    Some(response)
}

fn handle_initialize(params: &serde_json::Value) -> serde_json::Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);

    tracing::info!("MCP initialize: protocol version {}", protocol_version);

    serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": "pubmed-mcp",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn handle_tools_list(id: Option<serde_json::Value>, tools: &[Box<dyn McpTool>]) -> JsonRpcResponse {
    let tool_list: Vec<McpToolInfo> = tools
        .iter()
        .map(|t| McpToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect();

    JsonRpcResponse::success(id, serde_json::json!({ "tools": tool_list }))
}

async fn handle_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> JsonRpcResponse {
    let tool_name = match params.get("name").and_then(|v| v.as_str()) {
        Some(name) => name,
        None => {
            return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing 'name' parameter");
        }
    };

    let arguments = params.get("arguments").cloned().unwrap_or(serde_json::json!({}));

    let tool = match tools.iter().find(|t| t.name() == tool_name) {
        Some(t) => t,
        None => {
            return JsonRpcResponse::error(
                id,
                codes::INVALID_PARAMS,
                format!("Tool not found: {}", tool_name),
            );
        }
    };

    tracing::info!(tool = %tool_name, "Executing tool");

    match tool.execute(ctx, arguments).await {
        Ok(result) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": result
                }]
            }),
        ),
        Err(e) => {
            tracing::error!(tool = %tool_name, error = %e, "Tool execution failed");
            JsonRpcResponse::error(
                id,
                codes::TOOL_ERROR,
                format!("Tool error: {}", e.to_user_message()),
            )
        }
    }
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub tools: Vec<Box<dyn McpTool>>,
    pub ctx: ToolContext,
}

/// Create the HTTP router for MCP.
pub fn create_router(tools: Vec<Box<dyn McpTool>>, ctx: ToolContext) -> Router {
    let state = Arc::new(HttpState { tools, ctx });

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/mcp", post(handle_mcp_post))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pubmed-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "service": "pubmed-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.tools.len()
    }))
}

/// Handle POST requests to /mcp (Streamable HTTP transport, JSON responses only).
async fn handle_mcp_post(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let req = match parse_request(&body) {
        Ok(req) => req,
        Err(error) => return (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    };

    tracing::debug!(method = %req.method, "Handling MCP POST request");

    // A new session starts at initialize; afterwards the client echoes it back.
    let session_id = if req.method == "initialize" {
        Some(uuid::Uuid::new_v4().to_string())
    } else {
        headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()).map(str::to_string)
    };

    let mut response = match handle_request(&req, &state.tools, &state.ctx).await {
        Some(rpc) => Json(rpc).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };

    if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(&id).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }

    response
}
