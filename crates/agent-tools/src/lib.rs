//! # agent-tools
//!
//! Tool server for commerce-agent.
//! Exposes endpoint lookup and commerce API requests to an agent over stdio or HTTP.

pub mod config;
mod error;
pub mod protocol;
mod server;
pub mod tools;
pub mod transport;

pub use config::{Settings, SettingsManager};
pub use error::{AgentError, Result};
pub use protocol::{RequestHandler, RpcError, RpcRequest, RpcResponse};
pub use server::{AgentServer, ServerMode};
pub use tools::{EndpointResolver, RequestExecutor, ToolCatalog};
pub use transport::{HttpTransport, StdioTransport};
