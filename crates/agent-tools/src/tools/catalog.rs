//! Tool definitions and argument dispatch

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::{EndpointResolver, RequestExecutor};
use crate::error::{AgentError, Result};
use crate::protocol::ToolDefinition;

pub const FIND_MATCHING_ENDPOINT: &str = "find_matching_endpoint";
pub const GET_SPEC_FOR_ENDPOINT: &str = "get_spec_for_endpoint";
pub const GET_API_SPEC: &str = "get_api_spec";
pub const EXEC_GET_REQUEST: &str = "exec_get_request";
pub const EXEC_POST_REQUEST: &str = "exec_post_request";
pub const EXEC_PUT_REQUEST: &str = "exec_put_request";

#[derive(Deserialize)]
struct ActionArgs {
    action: String,
}

#[derive(Deserialize)]
struct QueryArgs {
    endpoint: String,
}

#[derive(Deserialize)]
struct RequestArgs {
    endpoint: String,
    token: String,
    #[serde(default)]
    params: Option<Map<String, Value>>,
    #[serde(default)]
    body: Option<Value>,
}

/// The tools the agent can call
pub struct ToolCatalog {
    resolver: Arc<EndpointResolver>,
    executor: Arc<RequestExecutor>,
}

impl ToolCatalog {
    pub fn new(resolver: Arc<EndpointResolver>, executor: Arc<RequestExecutor>) -> Self {
        Self { resolver, executor }
    }

    /// Definitions for every tool
    pub fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            tool(
                FIND_MATCHING_ENDPOINT,
                "Given an action such as \"list all the nodes\", returns the single API endpoint \
                 that performs it, as \"METHOD /path\".",
                &[("action", "Action to perform, in plain words")],
            ),
            tool(
                GET_SPEC_FOR_ENDPOINT,
                "Returns the OpenAPI docs for every \"METHOD /path\" found in the input, e.g. \
                 \"GET /pcm/products/{product_id}\". Path parameters may be filled in.",
                &[("endpoint", "Text containing one or more METHOD /path strings")],
            ),
            tool(
                GET_API_SPEC,
                "Given an action, finds the matching endpoint and returns its OpenAPI docs.",
                &[("action", "Action to perform, in plain words")],
            ),
            request_tool(EXEC_GET_REQUEST, "Executes a GET request to the specified endpoint.", "params"),
            request_tool(EXEC_POST_REQUEST, "Executes a POST request to the specified endpoint.", "body"),
            request_tool(EXEC_PUT_REQUEST, "Executes a PUT request to the specified endpoint.", "body"),
        ]
    }

    /// Run tool `name` and return its text output
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> Result<String> {
        debug!("Dispatching tool: {}", name);
        let arguments = arguments.unwrap_or_else(|| Value::Object(Map::new()));

        match name {
            FIND_MATCHING_ENDPOINT => {
                let args: ActionArgs = parse_args(arguments)?;
                self.resolver.find_matching_endpoint(&args.action).await
            }
            GET_SPEC_FOR_ENDPOINT => {
                let args: QueryArgs = parse_args(arguments)?;
                self.resolver.get_spec_for_endpoint(&args.endpoint).await
            }
            GET_API_SPEC => {
                let args: ActionArgs = parse_args(arguments)?;
                self.resolver.get_api_spec(&args.action).await
            }
            EXEC_GET_REQUEST => {
                let args: RequestArgs = parse_args(arguments)?;
                let result = self
                    .executor
                    .get(&args.endpoint, &args.token, args.params.as_ref())
                    .await?;
                Ok(serde_json::to_string_pretty(&result)?)
            }
            EXEC_POST_REQUEST => {
                let args: RequestArgs = parse_args(arguments)?;
                let result = self
                    .executor
                    .post(&args.endpoint, &args.token, args.body.as_ref())
                    .await?;
                Ok(serde_json::to_string_pretty(&result)?)
            }
            EXEC_PUT_REQUEST => {
                let args: RequestArgs = parse_args(arguments)?;
                let result = self
                    .executor
                    .put(&args.endpoint, &args.token, args.body.as_ref())
                    .await?;
                Ok(serde_json::to_string_pretty(&result)?)
            }
            other => Err(AgentError::UnknownTool(other.to_string())),
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| AgentError::InvalidArguments(e.to_string()))
}

/// A tool whose arguments are all required strings
fn tool(name: &'static str, description: &'static str, args: &[(&str, &str)]) -> ToolDefinition {
    let properties: Map<String, Value> = args
        .iter()
        .map(|(arg, about)| (arg.to_string(), json!({"type": "string", "description": about})))
        .collect();
    let required: Vec<&str> = args.iter().map(|(arg, _)| *arg).collect();

    ToolDefinition {
        name,
        description,
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

/// An execution tool: endpoint + token, plus optional query params (GET) or JSON body
fn request_tool(name: &'static str, description: &'static str, payload: &str) -> ToolDefinition {
    let mut definition = tool(
        name,
        description,
        &[
            ("endpoint", "Path appended to the API base URL, e.g. /pcm/products"),
            ("token", "Bearer token for the Authorization header"),
        ],
    );

    let about = if payload == "params" {
        "Query parameters"
    } else {
        "JSON request body"
    };
    if let Some(properties) = definition.input_schema["properties"].as_object_mut() {
        properties.insert(payload.to_string(), json!({"type": "object", "description": about}));
    }

    definition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::tools::resolver::tests::{resolver, spec_file};

    fn catalog(spec: &tempfile::NamedTempFile, base_url: &str) -> ToolCatalog {
        let settings = Settings {
            base_url: base_url.to_string(),
            ..Settings::new()
        };
        ToolCatalog::new(
            Arc::new(resolver(spec, "GET /pcm/hierarchies/{hierarchyID}/nodes")),
            Arc::new(RequestExecutor::new(&settings).unwrap()),
        )
    }

    #[test]
    fn test_tool_definitions() {
        let spec = spec_file();
        let tools = catalog(&spec, "http://localhost").tools();

        let names: Vec<&str> = tools.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                FIND_MATCHING_ENDPOINT,
                GET_SPEC_FOR_ENDPOINT,
                GET_API_SPEC,
                EXEC_GET_REQUEST,
                EXEC_POST_REQUEST,
                EXEC_PUT_REQUEST,
            ]
        );

        let post = &tools[4].input_schema;
        assert_eq!(post["type"], "object");
        assert_eq!(post["properties"]["body"]["type"], "object");
        assert_eq!(post["required"], json!(["endpoint", "token"]));

        let get = &tools[3].input_schema;
        assert!(get["properties"]["params"].is_object());
        assert!(get["properties"].get("body").is_none());
    }

    #[tokio::test]
    async fn test_call_lookup_tools() {
        let spec = spec_file();
        let catalog = catalog(&spec, "http://localhost");

        let endpoint = catalog
            .call(FIND_MATCHING_ENDPOINT, Some(json!({"action": "list all the nodes"})))
            .await
            .unwrap();
        assert_eq!(endpoint, "GET /pcm/hierarchies/{hierarchyID}/nodes");

        let docs = catalog
            .call(GET_SPEC_FOR_ENDPOINT, Some(json!({"endpoint": endpoint})))
            .await
            .unwrap();
        assert!(docs.contains("== Docs for GET /pcm/hierarchies/{hierarchyID}/nodes =="));
    }

    #[tokio::test]
    async fn test_call_exec_get() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pcm/products")
            .match_header("authorization", "Bearer abc")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let spec = spec_file();
        let catalog = catalog(&spec, &server.url());
        let output = catalog
            .call(
                EXEC_GET_REQUEST,
                Some(json!({"endpoint": "/pcm/products", "token": "abc"})),
            )
            .await
            .unwrap();

        assert_eq!(serde_json::from_str::<Value>(&output).unwrap(), json!({"data": []}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_bad_arguments_and_unknown_tool() {
        let spec = spec_file();
        let catalog = catalog(&spec, "http://localhost");

        let result = catalog.call(GET_API_SPEC, Some(json!({"text": "oops"}))).await;
        assert!(matches!(result, Err(AgentError::InvalidArguments(_))));

        let result = catalog.call("exec_delete_request", None).await;
        assert!(matches!(result, Err(AgentError::UnknownTool(_))));
    }
}
