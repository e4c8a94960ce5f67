//! Type definitions for raw and reduced OpenAPI specs

use serde::{Deserialize, Serialize};

/// A parsed OpenAPI document, kept as an insertion-ordered YAML tree.
///
/// Nothing is validated beyond the root being a mapping with a `paths` entry;
/// `$ref` pointers are left exactly as written.
pub type RawSpec = serde_yaml::Value;

/// HTTP methods an OpenAPI path item may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a path item key. OpenAPI field names are case-sensitive, so only
    /// the lowercase forms (`get`, `post`, ...) are methods.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One method + path operation taken from a reduced spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    /// `"<METHOD> <path-template>"`, e.g. `"GET /pcm/products/{product_id}"`
    pub name: String,
    /// Short summary, at most [`MAX_DESCRIPTION_CHARS`] characters; empty if the operation had none
    pub description: String,
    /// Reduced operation object (description, required parameters, 200 response, request body)
    pub docs: serde_yaml::Value,
}

impl EndpointRecord {
    /// Line used when listing this endpoint to the matcher model
    pub fn prompt_line(&self) -> String {
        if self.description.is_empty() {
            format!("{} {}", self.name, MISSING_DESCRIPTION)
        } else {
            format!("{} {}", self.name, self.description)
        }
    }
}

/// Upper bound on `EndpointRecord::description`, in characters
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Placeholder written into prompt text for endpoints without a description
pub const MISSING_DESCRIPTION: &str = "(no description)";

/// A spec flattened into endpoint records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReducedSpec {
    /// Server URLs declared by the document
    pub servers: Vec<String>,
    /// API description from `info.description`
    pub description: String,
    /// Endpoints in document order
    pub endpoints: Vec<EndpointRecord>,
}

/// Options for spec reduction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReduceOptions {
    /// Inline local `$ref` pointers in endpoint docs
    pub dereference: bool,
}

/// How a record's path template is compared against a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The query must start with the record's pattern
    #[default]
    Prefix,
    /// The query must match the record's pattern completely
    Exact,
}

/// Options for endpoint docs extraction
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub mode: MatchMode,
    /// Fail when a query matches more than one record instead of returning all of them
    pub reject_ambiguous: bool,
}
