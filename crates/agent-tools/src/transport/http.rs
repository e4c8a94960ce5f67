//! HTTP transport for the tool server

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::protocol::{RequestHandler, RpcRequest};

/// HTTP transport: JSON-RPC over `POST /mcp`
pub struct HttpTransport {
    handler: Arc<RequestHandler>,
    port: u16,
}

impl HttpTransport {
    pub fn new(handler: Arc<RequestHandler>, port: u16) -> Self {
        Self { handler, port }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(health))
            .route("/health", get(health))
            .route("/mcp", post(handle_request))
            .layer(cors)
            .with_state(self.handler.clone())
    }

    /// Run the HTTP server
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("0.0.0.0:{}", self.port);
        info!("Starting tool server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

async fn health() -> &'static str {
    "OK"
}

/// One JSON-RPC message per POST; notifications are acknowledged with 202
async fn handle_request(
    State(handler): State<Arc<RequestHandler>>,
    Json(request): Json<RpcRequest>,
) -> Response {
    debug!("HTTP request: {:?}", request.method);

    match handler.handle(request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
