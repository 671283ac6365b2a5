//! Text generation over an OpenAI-compatible chat-completions endpoint.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::platform::PlatformSendSync;
use core_runtime::config::ModelSettings;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{ChatError, Result};

const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait TextGenerator: PlatformSendSync {
    /// Complete `prompt` into a single answer.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct OpenAiTextGenerator {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiTextGenerator {
    pub fn new(http_client: Arc<dyn HttpClient>, settings: &ModelSettings) -> Self {
        Self {
            http_client,
            api_key: settings.api_key.trim().to_string(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl TextGenerator for OpenAiTextGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_tokens,
        });
        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/chat/completions", self.base_url),
        )
        .bearer_token(&self.api_key)
        .json(&body)?
        .timeout(GENERATION_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Chat completion rejected");
            return Err(ChatError::Generation(format!(
                "status {}: {}",
                response.status,
                String::from_utf8_lossy(&response.body)
            )));
        }

        let completion: ChatCompletion = serde_json::from_slice(&response.body)
            .map_err(|e| ChatError::Generation(format!("invalid response: {}", e)))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ChatError::Generation("response contained no choices".to_string()))?;

        debug!(answer_len = text.len(), "Chat completion received");
        Ok(text)
    }
}
