//! Chat-completion transform for Azure OpenAI deployments.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use restyle_core::StyleProfile;
use restyle_translate::{TextTransform, TransformError};
use serde::{Deserialize, Serialize};

/// API version used when `AZURE_OPENAI_API_VERSION` is not set.
const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Upper bound on generated tokens per call.
const MAX_COMPLETION_TOKENS: u32 = 900;

const SYSTEM_PROMPT: &str = "You are a marketing content translator that adapts messaging for \
different generations. Maintain the core message while adapting the language, tone, and \
references to resonate with the target generation. Keep responses concise and reply with the \
rewritten text only.";

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
}

/// Message in a chat completion request or response
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TokenUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// Restyles text through an Azure OpenAI chat deployment.
pub struct ChatCompletionTransform {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

impl ChatCompletionTransform {
    /// Create a transform for one deployment.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Use a specific API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Read endpoint, key, deployment and optional API version from the environment.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("Azure OpenAI configuration missing: set {}", name))
        };

        let transform = Self::new(
            var("AZURE_OPENAI_ENDPOINT")?,
            var("AZURE_OPENAI_API_KEY")?,
            var("AZURE_OPENAI_DEPLOYMENT_NAME")?,
        );

        Ok(match std::env::var("AZURE_OPENAI_API_VERSION") {
            Ok(version) if !version.trim().is_empty() => transform.with_api_version(version),
            _ => transform,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    fn build_request(text: &str, profile: StyleProfile) -> ChatRequest {
        let user = format!(
            "{}\n\nPlease translate the following marketing content to match the communication \
             style of this generation. Maintain the core message while adapting the language, \
             tone, and cultural references appropriately:\n\nOriginal content: \"{}\"",
            profile.instructions(),
            text
        );

        ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user),
                },
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        }
    }

    fn extract_text(response: ChatResponse) -> Result<String, TransformError> {
        if let Some(usage) = &response.usage {
            log::debug!(
                "API usage - input tokens: {}, output tokens: {}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| strip_wrapping_quotes(text.trim()).to_string())
            .filter(|text| !text.is_empty())
            .ok_or(TransformError::EmptyResponse)
    }
}

impl std::fmt::Debug for ChatCompletionTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionTransform")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TextTransform for ChatCompletionTransform {
    async fn transform(&self, text: &str, profile: StyleProfile) -> Result<String, TransformError> {
        let response = self
            .client
            .post(self.url())
            .header("api-key", &self.api_key)
            .json(&Self::build_request(text, profile))
            .send()
            .await
            .map_err(|e| TransformError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            log::error!("Azure OpenAI API error ({}): {}", status, message);
            return Err(TransformError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| TransformError::ParseError(e.to_string()))?;

        Self::extract_text(body)
    }
}

/// The prompt quotes the original, and models often echo the quotes back.
fn strip_wrapping_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|t| !t.contains('"'))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let transform =
            ChatCompletionTransform::new("https://example.openai.azure.com/", "key", "gpt")
                .with_api_version("2024-05-01");
        assert_eq!(
            transform.url(),
            concat!(
                "https://example.openai.azure.com/openai/deployments/gpt/chat/completions",
                "?api-version=2024-05-01"
            )
        );
    }

    #[test]
    fn test_request_carries_profile_instructions() {
        let request = ChatCompletionTransform::build_request("Save more", StyleProfile::Boomers);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        let user = json["messages"][1]["content"].as_str().unwrap();
        assert!(user.starts_with(StyleProfile::Boomers.instructions()));
        assert!(user.ends_with("Original content: \"Save more\""));
        assert_eq!(json["max_completion_tokens"], 900);
    }

    #[test]
    fn test_extract_text() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":" \"No cap, save more\" "}}],
                "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#,
        )
        .unwrap();
        assert_eq!(
            ChatCompletionTransform::extract_text(response).unwrap(),
            "No cap, save more"
        );
    }

    #[test]
    fn test_extract_text_without_content() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(matches!(
            ChatCompletionTransform::extract_text(response),
            Err(TransformError::EmptyResponse)
        ));

        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(ChatCompletionTransform::extract_text(response).is_err());
    }

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("\"Hi\""), "Hi");
        assert_eq!(strip_wrapping_quotes("\"A\" and \"B\""), "\"A\" and \"B\"");
        assert_eq!(strip_wrapping_quotes("plain"), "plain");
    }

    #[test]
    fn test_debug_hides_key() {
        let transform = ChatCompletionTransform::new("https://x", "secret-key", "gpt");
        assert!(!format!("{:?}", transform).contains("secret-key"));
    }
}
