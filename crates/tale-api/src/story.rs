//! # Story Generation
//!
//! Relays a prompt to an OpenAI-compatible chat completion endpoint with a
//! fixed children's-story system prompt.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use tale_core::{GateError, GateResult, StoryGenerator};
use tracing::{debug, error, instrument};

pub const GROQ_API_URL: &str = "https://api.groq.com";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const NO_REPLY: &str = "No reply";

pub const STORY_SYSTEM_PROMPT: &str = "Kamu adalah penulis cerita anak. Ceritamu harus positif, imajinatif, dan mudah dimengerti anak usia 6-10 tahun.";

/// Chat completion configuration
#[derive(Clone)]
pub struct StoryConfig {
    pub api_key: String,
    pub model: String,
    /// API base URL (for testing/mocking)
    pub api_base_url: String,
    pub system_prompt: String,
}

impl StoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `GROQ_API_KEY`
    ///
    /// Optional:
    /// - `GROQ_MODEL` (default `llama3-8b-8192`)
    pub fn from_env() -> Result<Self, GateError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, GateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| GateError::Configuration("GROQ_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(model) = lookup("GROQ_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }

        Ok(config)
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: GROQ_API_URL.to_string(),
            system_prompt: STORY_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/openai/v1/chat/completions", self.api_base_url)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

impl std::fmt::Debug for StoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Chat completion client
pub struct ChatCompletionClient {
    config: StoryConfig,
    client: Client,
}

impl ChatCompletionClient {
    pub fn new(config: StoryConfig) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| GateError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl StoryGenerator for ChatCompletionClient {
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> GateResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GateError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Chat completion error: status={}, body={}", status, text);

            let message = serde_json::from_str::<ChatErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, text));

            return Err(GateError::upstream("groq", message));
        }

        let completion: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            GateError::upstream("groq", format!("Failed to parse completion: {}", e))
        })?;

        debug!("Completion received: {} choices", completion.choices.len());

        Ok(first_reply(completion))
    }
}

/// First choice's content, trimmed, or [`NO_REPLY`]
fn first_reply(completion: ChatResponse) -> String {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| NO_REPLY.to_string())
}

// =============================================================================
// Chat API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}
