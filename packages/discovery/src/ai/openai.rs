//! OpenAI-compatible implementation of the AI trait.
//!
//! Talks to any `/chat/completions` endpoint (OpenAI, OpenRouter, Azure
//! proxies) selected through [`LlmCredentials::base_url`].
//!
//! # Example
//!
//! ```rust,ignore
//! use discovery::ai::OpenAI;
//!
//! let ai = OpenAI::new("sk-...").with_model("gpt-4o-mini");
//! let text = ai.complete("List three colors").await?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DiscoveryError, Result};
use crate::http;
use crate::security::{ApiKey, LlmCredentials};
use crate::traits::ai::AI;

const SERVICE: &str = "llm";

/// Chat-completions backed AI implementation.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    system_prompt: String,
}

impl OpenAI {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self::from_credentials(LlmCredentials::new(api_key, "gpt-4o-mini"))
    }

    /// Create from loaded credentials.
    pub fn from_credentials(credentials: LlmCredentials) -> Self {
        Self {
            client: http::client(Duration::from_secs(120)),
            api_key: credentials.api_key,
            model: credentials.model,
            base_url: credentials.base_url,
            system_prompt: "You are a precise market research analyst.".to_string(),
        }
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for OpenRouter, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AI for OpenAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: 2048,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose())
            .json(&request);
        let chat_response: ChatResponse = http::send_json(SERVICE, request).await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DiscoveryError::Malformed {
                service: SERVICE,
                message: "no choices in completion".into(),
            })
    }
}
