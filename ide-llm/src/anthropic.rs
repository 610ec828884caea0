use crate::config::AnthropicConfig;
use crate::error::{LlmError, Result};
use crate::openai::probe_result_from_status;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, ProbeResult, Provider,
    Role, Usage,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROBE_MAX_TOKENS: u32 = 10;

#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    config: AnthropicConfig,
    messages_url: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, config: AnthropicConfig) -> Self {
        Self {
            http,
            config,
            messages_url: ANTHROPIC_MESSAGES_URL.to_string(),
        }
    }

    /// Points the client at a different Messages API root, e.g. a proxy.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.messages_url = format!("{}/messages", base_url.trim_end_matches('/'));
        self
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn post(&self, body: &AnthropicRequest<'_>) -> reqwest::RequestBuilder {
        self.http
            .post(&self.messages_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .json(body)
    }

    /// Sends a 10-token message to confirm the key and model are accepted.
    #[tracing::instrument(level = "info", skip_all, fields(provider = "anthropic"))]
    pub async fn probe(&self) -> ProbeResult {
        if !self.is_configured() {
            return ProbeResult::failed(
                LlmError::NotConfigured {
                    provider: Provider::Anthropic,
                }
                .to_string(),
            );
        }

        let messages = [AnthropicMessage {
            role: "user",
            content: "test",
        }];
        let req = AnthropicRequest {
            model: &self.config.model,
            max_tokens: PROBE_MAX_TOKENS,
            messages: &messages,
            system: None,
            temperature: None,
        };

        match self.post(&req).send().await {
            Ok(response) => probe_result_from_status(response.status()),
            Err(e) => {
                tracing::warn!(%e, "anthropic probe failed");
                ProbeResult::failed(e.to_string())
            }
        }
    }

    /// Runs a completion through the Messages API and reshapes the reply
    /// into the OpenAI-style response.
    #[tracing::instrument(level = "info", skip_all, fields(provider = "anthropic"))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured {
                provider: Provider::Anthropic,
            });
        }
        if request.stream == Some(true) {
            return Err(LlmError::InvalidInput(
                "streaming responses are not supported".to_string(),
            ));
        }

        let (system, messages) = split_system(&request.messages);
        if messages.is_empty() {
            return Err(LlmError::InvalidInput(
                "anthropic requires at least one user or assistant message".to_string(),
            ));
        }
        let model = request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(self.config.model.as_str());
        let req = AnthropicRequest {
            model,
            max_tokens: request
                .max_tokens
                .filter(|&n| n > 0)
                .unwrap_or(self.config.max_tokens),
            messages: &messages,
            system: system.as_deref(),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
        };
        tracing::debug!(
            url = %self.messages_url,
            model = %req.model,
            messages = messages.len(),
            "sending anthropic message"
        );

        let response = self
            .post(&req)
            .send()
            .await
            .map_err(|e| LlmError::transport(Provider::Anthropic, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::transport(Provider::Anthropic, e))?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "anthropic message rejected");
            return Err(LlmError::Api {
                provider: Provider::Anthropic,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)?;
        Ok(parsed.into())
    }
}

fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage<'_>>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let rest = messages
        .iter()
        .filter_map(|m| match m.role {
            Role::System => None,
            Role::User => Some(AnthropicMessage {
                role: "user",
                content: &m.content,
            }),
            Role::Assistant => Some(AnthropicMessage {
                role: "assistant",
                content: &m.content,
            }),
        })
        .collect();
    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, rest)
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [AnthropicMessage<'a>],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl From<AnthropicResponse> for ChatCompletionResponse {
    fn from(v: AnthropicResponse) -> Self {
        let content: String = v
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect();
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        ChatCompletionResponse {
            id: v.id,
            object: "chat.completion".to_string(),
            created,
            model: v.model,
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(content),
                finish_reason: v.stop_reason.unwrap_or_default(),
            }],
            usage: Usage {
                prompt_tokens: v.usage.input_tokens,
                completion_tokens: v.usage.output_tokens,
                total_tokens: v.usage.input_tokens.saturating_add(v.usage.output_tokens),
            },
        }
    }
}
