//! Generation oracle client
//!
//! The oracle is a black-box text-generation service consumed through a
//! prompt/response contract. `Oracle` is the seam: the engine only ever sees
//! the trait, so tests substitute a scripted implementation.

pub mod decision;
pub mod prompt;

pub use decision::Decision;

use crate::config::OracleConfig;
use crate::errors::{AgentError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// The single blocking call of the AwaitingDecision phase
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Submit a prompt, return the raw text reply
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Oracle client for an OpenAI-compatible chat-completions endpoint
pub struct ChatOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl ChatOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(ChatOracle {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut request = self.client.post(&url).json(&json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt },
                { "role": "user", "content": "Respond in JSON format as instructed." },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::OracleError(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::OracleError(format!(
                "oracle returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::OracleError(format!("unreadable oracle reply: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AgentError::OracleError("oracle reply had no choices".to_string()))
    }
}
