//! Endpoint lookup and request execution tools

mod catalog;
mod executor;
pub(crate) mod resolver;

pub use catalog::ToolCatalog;
pub use executor::RequestExecutor;
pub use resolver::EndpointResolver;
