//! Model invocation
//!
//! A step needs exactly one completion per call. [`CompletionModel`] is the
//! seam; [`GenaiModel`] is the stock implementation on top of genai's
//! streaming chat client.

use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent};
use genai::{Client, Headers};
use tracing::{debug, info};

use crate::config::StepRuntimeConfig;
use crate::prompts::PromptVars;

/// Credential attached to a model request
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as `x-api-key`
    ApiKey(String),
    /// Sent as `authorization: Bearer ...`
    Bearer(String),
}

impl Credential {
    fn headers(&self) -> Headers {
        match self {
            Self::ApiKey(key) => Headers::from([("x-api-key".to_string(), key.clone())]),
            Self::Bearer(token) => Headers::from([(
                "authorization".to_string(),
                format!("Bearer {}", token),
            )]),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// A fully rendered prompt plus the variables it was rendered from
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub prompt: String,
    pub variables: PromptVars,
    pub credential: Option<Credential>,
}

/// Produces one raw completion for a prompt. Failures are returned as-is.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, request: &PromptRequest) -> Result<String>;
}

/// Completion model backed by genai
pub struct GenaiModel {
    client: Client,
    model: String,
    max_tokens: u32,
}

impl GenaiModel {
    pub fn new(config: &StepRuntimeConfig) -> Self {
        Self {
            client: Client::default(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionModel for GenaiModel {
    async fn complete(&self, request: &PromptRequest) -> Result<String> {
        let chat = ChatRequest::new(vec![ChatMessage::user(request.prompt.clone())]);

        let mut options = ChatOptions::default()
            .with_max_tokens(self.max_tokens)
            .with_capture_usage(true);
        if let Some(ref credential) = request.credential {
            options = options.with_extra_headers(credential.headers());
        }

        let response = self
            .client
            .exec_chat_stream(&self.model, chat, Some(&options))
            .await
            .with_context(|| format!("API error ({})", self.model))?;

        let mut stream = Box::pin(response.stream);
        let mut completion = String::new();

        while let Some(event) = stream.next().await {
            match event.context("Stream error")? {
                ChatStreamEvent::Chunk(chunk) => completion.push_str(&chunk.content),
                ChatStreamEvent::End(end) => {
                    if let Some(ref usage) = end.captured_usage {
                        info!(
                            "Completion usage: prompt={:?} completion={:?}",
                            usage.prompt_tokens, usage.completion_tokens
                        );
                    }
                },
                _ => {},
            }
        }

        debug!("Completion from {}: {} chars", self.model, completion.len());
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let key = Credential::ApiKey("sk-secret".to_string());
        assert_eq!(format!("{:?}", key), "ApiKey(<redacted>)");

        let request = PromptRequest {
            prompt: "hi".to_string(),
            variables: PromptVars::default(),
            credential: Some(Credential::Bearer("tok-secret".to_string())),
        };
        assert!(!format!("{:?}", request).contains("secret"));
    }

    #[test]
    fn test_genai_model_uses_configured_model() {
        let config = StepRuntimeConfig {
            model: "claude-haiku-4-5".to_string(),
            ..StepRuntimeConfig::default()
        };
        assert_eq!(GenaiModel::new(&config).model(), "claude-haiku-4-5");
    }
}
