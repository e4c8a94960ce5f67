//! JSON-RPC request handler

use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::types::*;
use crate::tools::ToolCatalog;

const SERVER_NAME: &str = "commerce-agent";

/// Dispatches JSON-RPC requests to the tool catalog
pub struct RequestHandler {
    catalog: Arc<ToolCatalog>,
    /// Whether the client has sent `initialize`
    initialized: AtomicBool,
}

impl RequestHandler {
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self {
            catalog,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    /// Handle an incoming message. Notifications and stray replies produce no response.
    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        let Some(method) = request.method.as_deref() else {
            debug!("Ignoring message without a method");
            return None;
        };

        let Some(id) = request.id.clone() else {
            match method {
                "notifications/initialized" => info!("Client initialized"),
                "notifications/cancelled" => debug!("Request cancelled"),
                _ => debug!("Unknown notification: {}", method),
            }
            return None;
        };

        debug!("Handling request: {}", method);

        let outcome = match method {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => to_result(json!({ "tools": self.catalog.tools() })),
            "tools/call" => self.call_tool(request.params).await,
            _ => Err(RpcError::new(
                RpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        };

        Some(match outcome {
            Ok(result) => RpcResponse::result(id, result),
            Err(error) => RpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params: InitializeParams = parse_params(params)?;
        match params.client_info {
            Some(client) => info!("Initializing session with {} v{}", client.name, client.version),
            None => info!("Initializing session with unnamed client"),
        }

        self.initialized.store(true, Ordering::Relaxed);

        to_result(InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            capabilities: Capabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME,
                version: env!("CARGO_PKG_VERSION"),
            },
        })
    }

    /// Tool failures are reported in the result with `isError`, not as protocol errors
    async fn call_tool(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params: ToolCallParams = parse_params(params)?;
        debug!("Calling tool: {}", params.name);

        let output = match self.catalog.call(&params.name, params.arguments).await {
            Ok(text) => ToolOutput::success(text),
            Err(e) => {
                error!("Tool {} failed: {}", params.name, e);
                ToolOutput::failure(e.to_string())
            }
        };

        to_result(output)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    let params = params.ok_or_else(|| RpcError::new(RpcError::INVALID_PARAMS, "Missing params"))?;
    serde_json::from_value(params).map_err(|e| RpcError::new(RpcError::INVALID_PARAMS, e.to_string()))
}

fn to_result(value: impl serde::Serialize) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(RpcError::INTERNAL_ERROR, e.to_string()))
}
