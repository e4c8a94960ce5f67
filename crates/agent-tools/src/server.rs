//! Server orchestration

use std::sync::Arc;
use tracing::info;

use crate::protocol::RequestHandler;
use crate::tools::ToolCatalog;
use crate::transport::{HttpTransport, StdioTransport};

/// Server mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// Line-delimited JSON-RPC on stdin/stdout
    #[default]
    Stdio,
    /// JSON-RPC over HTTP
    Http { port: u16 },
}

/// Tool server
pub struct AgentServer {
    catalog: Arc<ToolCatalog>,
    mode: ServerMode,
}

impl AgentServer {
    /// Create a new server for `catalog`
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self {
            catalog,
            mode: ServerMode::default(),
        }
    }

    /// Set the server mode
    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run the server
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let handler = Arc::new(RequestHandler::new(self.catalog.clone()));
        match self.mode {
            ServerMode::Stdio => {
                info!("Starting tool server in stdio mode");
                StdioTransport::new(handler).run().await
            }
            ServerMode::Http { port } => {
                info!("Starting tool server in HTTP mode on port {}", port);
                HttpTransport::new(handler, port).run().await
            }
        }
    }
}
