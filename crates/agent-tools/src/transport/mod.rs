//! Transports for the tool server

mod stdio;
mod http;

pub use stdio::StdioTransport;
pub use http::HttpTransport;
