//! Pick the endpoint that best answers a natural-language action

use crate::error::{SpecError, SpecResult};
use crate::types::EndpointRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Instructions sent with every match request. `{apiendpoints}` is replaced
/// by the endpoint list, one `<name> <description>` line per record.
const SYSTEM_TEMPLATE: &str = "\
Agent that given an action can find the most appropriate API endpoint to answer the plan.
You can only use these API endpoints and their descriptions to find the right one:
{apiendpoints}
Your answer should be in the format of \"GET /pcm/products/{product_id}\" or \"POST /products\" and not include the description.";

/// A fully rendered match request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPrompt {
    /// Instructions plus the endpoint list
    pub system: String,
    /// The action text
    pub user: String,
}

/// External capability that answers a [`MatchPrompt`] with one line of text
#[async_trait]
pub trait TextMatcher: Send + Sync {
    /// Return the raw completion for `prompt`
    async fn complete(&self, prompt: &MatchPrompt) -> SpecResult<String>;
}

#[async_trait]
impl<T: TextMatcher + ?Sized> TextMatcher for Arc<T> {
    async fn complete(&self, prompt: &MatchPrompt) -> SpecResult<String> {
        (**self).complete(prompt).await
    }
}

/// Builds match prompts and delegates the choice to a [`TextMatcher`]
pub struct EndpointMatcher<M> {
    matcher: M,
}

impl<M: TextMatcher> EndpointMatcher<M> {
    pub fn new(matcher: M) -> Self {
        Self { matcher }
    }

    /// Render the prompt for `action` over `endpoints`
    pub fn prompt(action: &str, endpoints: &[EndpointRecord]) -> MatchPrompt {
        let listing = endpoints
            .iter()
            .map(EndpointRecord::prompt_line)
            .collect::<Vec<_>>()
            .join("\n");

        MatchPrompt {
            system: SYSTEM_TEMPLATE.replace("{apiendpoints}", &listing),
            user: action.to_string(),
        }
    }

    /// Ask the matcher for the best `"METHOD /path"`. The answer is returned verbatim.
    pub async fn find(&self, action: &str, endpoints: &[EndpointRecord]) -> SpecResult<String> {
        let prompt = Self::prompt(action, endpoints);
        debug!(
            "Matching action against {} endpoints ({} prompt bytes)",
            endpoints.len(),
            prompt.system.len()
        );

        let answer = self.matcher.complete(&prompt).await?;
        info!("Matched \"{}\" to \"{}\"", action, answer);
        Ok(answer)
    }
}

/// Settings for [`OpenAiMatcher`]
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API root, e.g. `https://api.openai.com/v1`
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

/// [`TextMatcher`] backed by an OpenAI-compatible chat-completions endpoint
pub struct OpenAiMatcher {
    client: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiMatcher {
    pub fn new(config: OpenAiConfig) -> SpecResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SpecError::HttpError(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextMatcher for OpenAiMatcher {
    async fn complete(&self, prompt: &MatchPrompt) -> SpecResult<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&json!({
                "model": self.config.model,
                "temperature": self.config.temperature,
                "messages": [
                    {"role": "system", "content": prompt.system},
                    {"role": "user", "content": prompt.user},
                ]
            }))
            .send()
            .await
            .map_err(|e| SpecError::MatcherError(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SpecError::MatcherError(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(SpecError::MatcherError(format!("HTTP {} - {}", status, body)));
        }

        let completion: ChatCompletion = serde_json::from_str(&body)
            .map_err(|e| SpecError::MatcherError(format!("invalid completion: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SpecError::MatcherError("completion has no content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers every prompt with a fixed string and remembers what it was asked
    struct FixedMatcher {
        answer: String,
        seen: Mutex<Vec<MatchPrompt>>,
    }

    #[async_trait]
    impl TextMatcher for FixedMatcher {
        async fn complete(&self, prompt: &MatchPrompt) -> SpecResult<String> {
            self.seen.lock().unwrap().push(prompt.clone());
            Ok(self.answer.clone())
        }
    }

    fn endpoints() -> Vec<EndpointRecord> {
        vec![
            EndpointRecord {
                name: "GET /pcm/hierarchies/{hierarchyID}/nodes".to_string(),
                description: "A fully paginated view of all nodes in a hierarchy.".to_string(),
                docs: serde_yaml::Value::Null,
            },
            EndpointRecord {
                name: "DELETE /pcm/products/{product_id}".to_string(),
                description: String::new(),
                docs: serde_yaml::Value::Null,
            },
        ]
    }

    #[test]
    fn test_prompt_lists_every_endpoint() {
        let prompt = EndpointMatcher::<FixedMatcher>::prompt("list all the nodes", &endpoints());

        assert_eq!(prompt.user, "list all the nodes");
        assert!(prompt.system.contains(
            "GET /pcm/hierarchies/{hierarchyID}/nodes A fully paginated view of all nodes in a hierarchy."
        ));
        assert!(prompt.system.contains("DELETE /pcm/products/{product_id} (no description)"));
        assert!(prompt.system.contains("not include the description"));
        assert!(!prompt.system.contains("{apiendpoints}"));
    }

    #[tokio::test]
    async fn test_find_returns_answer_verbatim() {
        let fixed = FixedMatcher {
            answer: " GET /pcm/hierarchies/{hierarchyID}/nodes\n".to_string(),
            seen: Mutex::new(Vec::new()),
        };
        let matcher = EndpointMatcher::new(fixed);

        let answer = matcher.find("list all the nodes", &endpoints()).await.unwrap();

        assert_eq!(answer, " GET /pcm/hierarchies/{hierarchyID}/nodes\n");
        assert_eq!(matcher.matcher.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_openai_matcher_parses_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.0
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"GET /pcm/products"}}]}"#)
            .create_async()
            .await;

        let matcher = OpenAiMatcher::new(OpenAiConfig {
            api_base: format!("{}/v1", server.url()),
            api_key: "sk-test".to_string(),
            ..OpenAiConfig::default()
        })
        .unwrap();

        let prompt = EndpointMatcher::<OpenAiMatcher>::prompt("list products", &endpoints());
        let answer = matcher.complete(&prompt).await.unwrap();

        assert_eq!(answer, "GET /pcm/products");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_matcher_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":"invalid api key"}"#)
            .create_async()
            .await;

        let matcher = OpenAiMatcher::new(OpenAiConfig {
            api_base: server.url(),
            ..OpenAiConfig::default()
        })
        .unwrap();

        let prompt = MatchPrompt {
            system: "s".to_string(),
            user: "u".to_string(),
        };
        match matcher.complete(&prompt).await {
            Err(SpecError::MatcherError(message)) => assert!(message.contains("invalid api key")),
            other => panic!("expected MatcherError, got {:?}", other),
        }
    }
}
