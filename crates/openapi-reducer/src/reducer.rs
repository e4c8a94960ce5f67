//! Flatten an OpenAPI document into endpoint records

use crate::dereference::Dereferencer;
use crate::error::{SpecError, SpecResult};
use crate::types::*;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Reduces raw OpenAPI documents to a compact endpoint list
pub struct SpecReducer;

impl SpecReducer {
    /// Reduce `raw` to one [`EndpointRecord`] per declared (method, path) pair, in document order
    pub fn reduce(raw: &RawSpec, options: &ReduceOptions) -> SpecResult<ReducedSpec> {
        let paths = raw
            .get("paths")
            .and_then(Value::as_mapping)
            .ok_or_else(|| SpecError::InvalidFormat("missing `paths` mapping".to_string()))?;

        let dereferencer = options.dereference.then(|| Dereferencer::new(raw));

        let mut endpoints = Vec::new();
        for (path, path_item) in paths {
            let Some(path) = path.as_str() else {
                continue;
            };
            let Some(path_item) = path_item.as_mapping() else {
                continue;
            };

            for (key, operation) in path_item {
                let Some(method) = key.as_str().and_then(HttpMethod::from_key) else {
                    continue;
                };

                let operation = match &dereferencer {
                    Some(d) => d.resolve(operation),
                    None => operation.clone(),
                };

                endpoints.push(EndpointRecord {
                    name: format!("{} {}", method, path),
                    description: Self::short_description(&operation),
                    docs: Self::reduce_docs(&operation),
                });
            }
        }

        debug!("Reduced spec to {} endpoints", endpoints.len());

        Ok(ReducedSpec {
            servers: Self::servers(raw),
            description: raw
                .get("info")
                .and_then(|info| info.get("description"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            endpoints,
        })
    }

    /// `description`, falling back to `summary`, cut to [`MAX_DESCRIPTION_CHARS`]
    fn short_description(operation: &Value) -> String {
        let text = ["description", "summary"]
            .iter()
            .filter_map(|key| operation.get(*key).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())
            .unwrap_or_default();

        truncate_chars(text, MAX_DESCRIPTION_CHARS)
    }

    /// Keep the description, required parameters, the 200 response and the request body
    fn reduce_docs(operation: &Value) -> Value {
        let mut docs = Mapping::new();

        if let Some(description) = operation.get("description").filter(|d| is_truthy(d)) {
            docs.insert("description".into(), description.clone());
        }

        if let Some(parameters) = operation.get("parameters").and_then(Value::as_sequence) {
            if !parameters.is_empty() {
                let required: Vec<Value> = parameters
                    .iter()
                    .filter(|p| p.get("required").and_then(Value::as_bool).unwrap_or(false))
                    .cloned()
                    .collect();
                docs.insert("parameters".into(), Value::Sequence(required));
            }
        }

        if let Some(ok) = operation.get("responses").and_then(Self::success_response) {
            docs.insert("responses".into(), ok.clone());
        }

        if let Some(body) = operation.get("requestBody").filter(|b| is_truthy(b)) {
            docs.insert("requestBody".into(), body.clone());
        }

        Value::Mapping(docs)
    }

    /// The `200` response; YAML may key it as a string or an integer
    fn success_response(responses: &Value) -> Option<&Value> {
        let responses = responses.as_mapping()?;
        responses
            .get("200")
            .or_else(|| responses.get(Value::Number(200u64.into())))
    }

    fn servers(raw: &RawSpec) -> Vec<String> {
        raw.get("servers")
            .and_then(Value::as_sequence)
            .map(|servers| {
                servers
                    .iter()
                    .filter_map(|s| s.get("url").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Null, empty strings and empty collections count as absent
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Sequence(s) => !s.is_empty(),
        Value::Mapping(m) => !m.is_empty(),
        _ => true,
    }
}

/// Cut `text` to at most `max` characters on a char boundary
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
