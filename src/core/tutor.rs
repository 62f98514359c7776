//! Tutor model client
//!
//! Sends the running conversation plus the new question to an
//! OpenAI-compatible chat-completions endpoint (OpenRouter by default) and
//! returns the tutor's reply.

use crate::config::Config;
use crate::conversation::ApiTurn;
use crate::error::{TutorError, TutorResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Anything that can answer a question given prior context
#[async_trait]
pub trait TutorBackend: Send + Sync {
    /// Ask `query` with `history` as context and return the reply text.
    ///
    /// Implementations must not retry on failure.
    async fn ask(&self, query: &str, history: &[ApiTurn]) -> TutorResult<String>;

    /// Whether the backend looks reachable
    async fn health_check(&self) -> bool {
        true
    }

    /// Backend name for logs
    fn name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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

/// Chat-completions client for OpenRouter and other compatible services
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: Option<String>,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatCompletionsClient {
    /// Create new client from config
    pub fn new(config: &Config) -> TutorResult<Self> {
        if config.model.trim().is_empty() {
            return Err(TutorError::Config("no model configured".to_string()));
        }
        if config.api_key.trim().is_empty() {
            warn!("⚠️ No API key configured; requests will likely be rejected");
        }

        let system_prompt = Some(config.system_prompt.trim().to_string()).filter(|p| !p.is_empty());

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            system_prompt,
        })
    }

    fn build_request<'a>(&'a self, query: &'a str, history: &'a [ApiTurn]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: prompt,
            });
        }
        messages.extend(history.iter().map(|turn| ChatMessage {
            role: match turn.role {
                crate::conversation::Role::User => "user",
                crate::conversation::Role::Assistant => "assistant",
            },
            content: &turn.content,
        }));
        messages.push(ChatMessage {
            role: "user",
            content: query,
        });

        ChatRequest {
            model: &self.model,
            messages,
        }
    }
}

#[async_trait]
impl TutorBackend for ChatCompletionsClient {
    async fn ask(&self, query: &str, history: &[ApiTurn]) -> TutorResult<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TutorError::InvalidInput("question is empty".to_string()));
        }

        let request = self.build_request(query, history);
        info!(
            "🧠 Asking {} ({} turns of context)",
            self.model,
            history.len()
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorError::Transport(e.to_string()))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| TutorError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!("❌ Tutor API Error ({}): {}", status, body_text);
            return Err(TutorError::Upstream(format!("HTTP {}: {}", status, body_text)));
        }

        debug!("🧠 Tutor raw body: {}", body_text);
        parse_reply(&body_text)
    }

    /// Health check - verify the endpoint is reachable
    async fn health_check(&self) -> bool {
        match self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}

/// Extract the first choice's text from a chat-completions body
fn parse_reply(body: &str) -> TutorResult<String> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        warn!("❌ Failed to deserialize tutor response: {} - Body: {}", e, body);
        TutorError::Upstream(format!("malformed response: {e}"))
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        return Err(TutorError::Upstream(
            "response contained no reply text".to_string(),
        ));
    }
    Ok(content)
}
