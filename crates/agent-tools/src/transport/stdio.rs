//! stdio transport: one JSON-RPC message per line

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use serde_json::Value;

use crate::protocol::{RequestHandler, RpcError, RpcRequest, RpcResponse};

/// stdio transport for the tool server
pub struct StdioTransport {
    handler: Arc<RequestHandler>,
}

impl StdioTransport {
    /// Create a new stdio transport
    pub fn new(handler: Arc<RequestHandler>) -> Self {
        Self { handler }
    }

    /// Serve stdin/stdout until EOF
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Starting tool server on stdio");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve any line-oriented reader/writer pair
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), Box<dyn std::error::Error>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();

            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let response = match serde_json::from_str::<RpcRequest>(line) {
                Ok(request) => self.handler.handle(request).await,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    Some(RpcResponse::error(
                        Value::Null,
                        RpcError::new(RpcError::PARSE_ERROR, format!("Parse error: {}", e)),
                    ))
                }
            };

            if let Some(response) = response {
                let response_line = serde_json::to_string(&response)?;
                debug!("Sending: {}", response_line);
                writer.write_all(response_line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }
}
