//! HTTP transport: router composition and JSON-RPC dispatch.
//!
//! One JSON-RPC envelope per POST to `/mcp` (no batching). Every response is
//! HTTP 200; protocol failures travel in the JSON-RPC `error` member and tool
//! failures in a successful result with `isError: true`.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use super::gate::{self, access_gate};
use super::oauth::handlers;
use super::oauth::store::CredentialStore;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::ToolError;
use crate::tools::{ToolContext, ToolRegistry};

/// MCP protocol revision announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// JSON-RPC error codes used by the dispatcher.
pub mod error_codes {
    /// Unknown method, or unknown tool in `tools/call`.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Unparseable request or other internal failure.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 response. `id` is always present, `null` when the request had none.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self { jsonrpc: Self::VERSION, id, result: Some(result), error: None }
    }

    #[must_use]
    pub fn error(id: serde_json::Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Self::VERSION,
            id,
            result: None,
            error: Some(JsonRpcError { code, message: message.into() }),
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

/// Methods the dispatcher answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    Initialize,
    ToolsList,
    ToolsCall,
}

impl RpcMethod {
    /// Resolve a method name; `None` for anything outside the table.
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "initialize" => Some(Self::Initialize),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            _ => None,
        }
    }
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub config: Config,
    pub store: Arc<dyn CredentialStore>,
    pub clock: Arc<dyn Clock>,
    pub tools: ToolRegistry,
    pub ctx: ToolContext,
}

impl std::fmt::Debug for HttpState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpState").field("tools", &self.tools).finish()
    }
}

/// Create the HTTP router: public OAuth endpoints plus gated MCP endpoint.
pub fn create_router(state: Arc<HttpState>) -> Router {
    let protected = Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(gate::ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(gate::ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(gate::ALLOW_HEADERS),
        ))
        // Outermost: rejected requests never reach the handlers or the CORS layers.
        .layer(middleware::from_fn_with_state(Arc::clone(&state), access_gate));

    Router::new()
        .route("/oauth/authorize", get(handlers::handle_authorize))
        .route("/oauth/token", post(handlers::handle_token))
        .route("/oauth/userinfo", get(handlers::handle_userinfo))
        .route("/oauth/revoke", post(handlers::handle_revoke))
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::handle_auth_server_metadata),
        )
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.tools.len()
    }))
}

async fn handle_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not_found" })))
}

/// Handle POST requests to /mcp.
async fn handle_mcp_post(State(state): State<Arc<HttpState>>, body: Bytes) -> Json<JsonRpcResponse> {
    Json(dispatch(&state, &body).await)
}

/// Decode one JSON-RPC envelope and route it.
pub async fn dispatch(state: &HttpState, body: &[u8]) -> JsonRpcResponse {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable JSON-RPC body");
            return JsonRpcResponse::error(
                serde_json::Value::Null,
                error_codes::INTERNAL_ERROR,
                e.to_string(),
            );
        }
    };

    let recovered_id = value.get("id").cloned().unwrap_or_default();
    let req: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed JSON-RPC envelope");
            return JsonRpcResponse::error(recovered_id, error_codes::INTERNAL_ERROR, e.to_string());
        }
    };

    tracing::debug!(method = %req.method, "Handling MCP request");

    match RpcMethod::parse(&req.method) {
        Some(RpcMethod::Initialize) => JsonRpcResponse::success(req.id, handle_initialize()),
        Some(RpcMethod::ToolsList) => handle_tools_list(req.id, &state.tools),
        Some(RpcMethod::ToolsCall) => handle_tools_call(req.id, &req.params, state).await,
        None => JsonRpcResponse::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Unknown method: {}", req.method),
        ),
    }
}

fn handle_initialize() -> serde_json::Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn handle_tools_list(id: serde_json::Value, tools: &ToolRegistry) -> JsonRpcResponse {
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
    id: serde_json::Value,
    params: &serde_json::Value,
    state: &HttpState,
) -> JsonRpcResponse {
    let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or_default();

    let Some(tool) = state.tools.get(tool_name) else {
        tracing::warn!(tool = %tool_name, "Unknown tool requested");
        return JsonRpcResponse::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Unknown tool: {tool_name}"),
        );
    };

    let arguments = match params.get("arguments") {
        None | Some(serde_json::Value::Null) => serde_json::json!({}),
        Some(args) if args.is_object() => args.clone(),
        Some(_) => {
            tracing::warn!(tool = %tool_name, "Tool arguments are not an object");
            let err = ToolError::validation("arguments", "must be an object of named arguments");
            return JsonRpcResponse::success(
                id,
                tool_content(format!("Error: {}", err.to_user_message()), true),
            );
        }
    };

    tracing::info!(tool = %tool_name, "Executing tool");

    match tool.execute(&state.ctx, arguments).await {
        Ok(text) => JsonRpcResponse::success(id, tool_content(text, false)),
        Err(e) => {
            tracing::error!(tool = %tool_name, error = %e, "Tool execution failed");
            JsonRpcResponse::success(id, tool_content(format!("Error: {}", e.to_user_message()), true))
        }
    }
}

fn tool_content(text: String, is_error: bool) -> serde_json::Value {
    serde_json::json!({
        "content": [{
            "type": "text",
            "text": text
        }],
        "isError": is_error
    })
}
