//! OpenRouter chat-completions provider.
//!
//! Speaks the OpenAI-compatible `/chat/completions` REST shape: Bearer auth,
//! JSON body with role-tagged messages, reply in `choices[0].message.content`.
//! One request per call: a failed call surfaces its typed error to the
//! caller with no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{BridgeError, Result};

use super::{map_transport_error, ChatOptions, ChatProvider, Message};

/// Attribution headers OpenRouter asks integrations to send.
const REFERER: &str = "https://github.com/craftbridge/craftbridge";
const TITLE: &str = "craftbridge";

/// Provider for any OpenAI-compatible chat endpoint, OpenRouter by default.
pub struct OpenRouterProvider {
    api_base: String,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenRouterProvider {
    /// Build a provider against the given endpoint.
    pub fn new(api_base: &str, api_key: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        }
    }

    /// Build from the provider config section.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            &config.api_base,
            &config.api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build the `/chat/completions` request body.
    pub fn build_request_body(
        messages: &[Message],
        model: &str,
        options: &ChatOptions,
    ) -> Value {
        let mut body = json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }

    /// Extract the first completion choice's content.
    pub fn extract_text(response: &Value) -> Option<String> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        options: &ChatOptions,
    ) -> Result<String> {
        let body = Self::build_request_body(messages, model, options);

        debug!(model, messages = messages.len(), "Chat completion request");

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Malformed(format!("invalid JSON: {e}")))?;

        Self::extract_text(&json)
            .ok_or_else(|| BridgeError::Malformed("response contained no choices".to_string()))
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenRouterProvider {
        OpenRouterProvider::new(
            "https://openrouter.ai/api/v1",
            "sk-test",
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_build_request_body_basic_shape() {
        let messages = vec![Message::user("Hi")];
        let body = OpenRouterProvider::build_request_body(
            &messages,
            "x-ai/grok-beta",
            &ChatOptions::default(),
        );
        assert_eq!(body["model"], "x-ai/grok-beta");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hi");
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_build_request_body_includes_options() {
        let messages = vec![Message::system("Be brief"), Message::user("Hi")];
        let options = ChatOptions {
            max_tokens: Some(150),
            temperature: Some(0.7),
        };
        let body = OpenRouterProvider::build_request_body(&messages, "m", &options);
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["messages"][0]["role"], "system");
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_extract_text_normal_response() {
        let response = serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Hello world" }
            }]
        });
        assert_eq!(
            OpenRouterProvider::extract_text(&response).as_deref(),
            Some("Hello world")
        );
    }

    #[test]
    fn test_extract_text_takes_first_choice() {
        let response = serde_json::json!({
            "choices": [
                { "message": { "content": "first" } },
                { "message": { "content": "second" } }
            ]
        });
        assert_eq!(
            OpenRouterProvider::extract_text(&response).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_extract_text_missing_choices() {
        let response = serde_json::json!({ "error": { "message": "nope" } });
        assert!(OpenRouterProvider::extract_text(&response).is_none());
    }

    #[test]
    fn test_extract_text_empty_choices() {
        let response = serde_json::json!({ "choices": [] });
        assert!(OpenRouterProvider::extract_text(&response).is_none());
    }

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        let p = OpenRouterProvider::new(
            "https://openrouter.ai/api/v1/",
            "k",
            Duration::from_secs(5),
        );
        assert_eq!(
            p.completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider().name(), "openrouter");
    }

    #[test]
    fn test_debug_redacts_key() {
        let repr = format!("{:?}", provider());
        assert!(!repr.contains("sk-test"));
        assert!(repr.contains("[REDACTED]"));
    }
}
