//! MCP protocol types and handling

mod types;
pub(crate) mod handler;

pub use types::*;
pub use handler::RequestHandler;
