//! Hugging Face inference provider
//!
//! Talks to the OpenAI-compatible chat completion API exposed by the Hugging
//! Face router (`https://router.huggingface.co/v1`). Any server speaking the
//! same protocol can be used by changing the API base.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{CabError, Result};
use crate::session::{Message, Role};

use super::{CompletionRequest, LLMProvider};

/// Longest error body kept in a [`CabError::ProviderStatus`].
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Chat completion provider backed by Hugging Face inference.
///
/// # Example
/// ```no_run
/// use cabchat::providers::{CompletionRequest, HuggingFaceProvider, LLMProvider};
///
/// # tokio_test::block_on(async {
/// let provider = HuggingFaceProvider::new("hf_xxx", "meta-llama/Llama-3.1-8B-Instruct").unwrap();
/// let text = provider.complete(CompletionRequest::prompt("Hello")).await.unwrap();
/// println!("{}", text);
/// # });
/// ```
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

impl<'a> From<&'a Message> for WireMessage<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            role: message.role,
            content: &message.content,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl HuggingFaceProvider {
    /// Create a provider with default generation settings.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let defaults = ProviderConfig::default();
        Ok(Self {
            client: build_client(defaults.timeout_secs)?,
            api_base: defaults.api_base,
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: defaults.max_new_tokens,
            temperature: defaults.temperature,
        })
    }

    /// Create a provider from the provider section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CabError::Config`] when no API key is configured.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| CabError::Config("provider API key is not set".into()))?;

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_base: config.api_base.clone(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_new_tokens,
            temperature: config.temperature,
        })
    }

    /// Point the provider at another OpenAI-compatible endpoint.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[async_trait]
impl LLMProvider for HuggingFaceProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop: (!request.stop.is_empty()).then_some(request.stop.as_slice()),
        };

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CabError::ProviderStatus {
                status: status.as_u16(),
                body: truncate_chars(text.trim(), MAX_ERROR_BODY_CHARS),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CabError::Provider(format!("malformed completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CabError::Provider("completion response contained no text".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> HuggingFaceProvider {
        HuggingFaceProvider::new("test-key", "test/model")
            .unwrap()
            .with_api_base(format!("{}/v1", server.uri()))
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "max_tokens": 512,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request =
            CompletionRequest::new(vec![Message::system("be brief"), Message::user("hi")]);
        let text = provider_for(&server).complete(request).await.unwrap();
        assert_eq!(text, "Hello!");
    }

    #[tokio::test]
    async fn test_stop_sequences_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stop": ["\nObservation:"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Thought: done"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CompletionRequest::prompt("q").with_stop("\nObservation:");
        let text = provider_for(&server).complete(request).await.unwrap();
        assert_eq!(text, "Thought: done");
    }

    #[tokio::test]
    async fn test_http_error_becomes_provider_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(CompletionRequest::prompt("hi"))
            .await
            .unwrap_err();
        match err {
            CabError::ProviderStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Invalid credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(CompletionRequest::prompt("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, CabError::Provider(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(CompletionRequest::prompt("hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("malformed completion response"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ProviderConfig::default();
        let err = HuggingFaceProvider::from_config(&config).err().unwrap();
        assert!(err.is_fatal());

        let config = ProviderConfig {
            api_key: Some("hf_key".into()),
            model: "custom/model".into(),
            ..ProviderConfig::default()
        };
        let provider = HuggingFaceProvider::from_config(&config).unwrap();
        assert_eq!(provider.model(), "custom/model");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = HuggingFaceProvider::new("k", "m")
            .unwrap()
            .with_api_base("http://localhost:8080/v1/");
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
