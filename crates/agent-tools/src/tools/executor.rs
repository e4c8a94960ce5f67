//! Execute commerce API requests

use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::error::{AgentError, Result};

/// Sends authenticated JSON requests to the commerce API
pub struct RequestExecutor {
    /// HTTP client
    client: Client,
    /// API root every endpoint is appended to
    base_url: String,
}

impl RequestExecutor {
    /// Create an executor for `settings.base_url`
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| AgentError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` with optional query parameters
    pub async fn get(
        &self,
        endpoint: &str,
        token: &str,
        params: Option<&Map<String, Value>>,
    ) -> Result<Value> {
        self.send(Method::GET, endpoint, token, params, None).await
    }

    /// POST a JSON body to `endpoint`
    pub async fn post(&self, endpoint: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::POST, endpoint, token, None, body).await
    }

    /// PUT a JSON body to `endpoint`
    pub async fn put(&self, endpoint: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        self.send(Method::PUT, endpoint, token, None, body).await
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
        params: Option<&Map<String, Value>>,
        body: Option<&Value>,
    ) -> Result<Value> {
        if !endpoint.starts_with('/') {
            return Err(AgentError::InvalidArguments(format!(
                "endpoint must start with '/': {}",
                endpoint
            )));
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json");

        if let Some(params) = params {
            let query: Vec<(String, String)> = params
                .iter()
                .map(|(key, value)| (key.clone(), query_value(value)))
                .collect();
            request = request.query(&query);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        info!("Executing {} {}", method, url);

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AgentError::Http(format!("Failed to read response: {}", e)))?;

        debug!("Response status: {}", status);

        if !status.is_success() {
            error!("Request failed with status {}: {}", status, response_text);
            return Err(AgentError::HttpStatus {
                status: status.as_u16(),
                body: response_text,
            });
        }

        if response_text.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response_text)?)
    }
}

/// Query strings carry scalars bare; arrays and objects as JSON
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn executor(url: &str) -> RequestExecutor {
        let settings = Settings {
            base_url: format!("{}/", url),
            ..Settings::new()
        };
        RequestExecutor::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn test_get_with_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pcm/hierarchies/h1/nodes")
            .match_query(mockito::Matcher::UrlEncoded("page[limit]".into(), "10".into()))
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":[{"id":"n1"}]}"#)
            .create_async()
            .await;

        let params = json!({"page[limit]": 10});
        let result = executor(&server.url())
            .get("/pcm/hierarchies/h1/nodes", "token-123", params.as_object())
            .await
            .unwrap();

        assert_eq!(result["data"][0]["id"], "n1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_and_put_send_json() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({"data": {"type": "product", "attributes": {"name": "Shirt"}}});

        let post = server
            .mock("POST", "/pcm/products")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(body.clone()))
            .with_status(201)
            .with_body(r#"{"data":{"id":"p1"}}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/pcm/products/p1")
            .match_body(mockito::Matcher::Json(body.clone()))
            .with_status(204)
            .create_async()
            .await;

        let executor = executor(&server.url());
        let created = executor.post("/pcm/products", "t", Some(&body)).await.unwrap();
        let updated = executor.put("/pcm/products/p1", "t", Some(&body)).await.unwrap();

        assert_eq!(created["data"]["id"], "p1");
        assert_eq!(updated, Value::Null);
        post.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pcm/products/missing")
            .with_status(404)
            .with_body(r#"{"errors":[{"title":"Not Found"}]}"#)
            .create_async()
            .await;

        let result = executor(&server.url())
            .get("/pcm/products/missing", "t", None)
            .await;

        match result {
            Err(AgentError::HttpStatus { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_relative_endpoint_rejected() {
        let result = executor("http://127.0.0.1:9").get("pcm/products", "t", None).await;
        assert!(matches!(result, Err(AgentError::InvalidArguments(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(executor("https://useast.api.elasticpath.com").base_url(), "https://useast.api.elasticpath.com");
    }
}
