use crate::config::OpenAiConfig;
use crate::error::{LlmError, Result};
use crate::prompts::{self, PromptTemplate};
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ProbeResult, Provider,
};
use serde::Serialize;
use std::time::Duration;

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenAiStatus {
    pub configured: bool,
    pub model: String,
    pub base_url: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        if config.api_key.is_empty() {
            tracing::warn!("OpenAI API key not configured; AI features will be limited");
        }
        Self { http, config }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub fn status(&self) -> OpenAiStatus {
        OpenAiStatus {
            configured: self.is_configured(),
            model: self.config.model.clone(),
            base_url: self.config.base_url.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    #[tracing::instrument(level = "info", skip_all, fields(provider = "openai"))]
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured {
                provider: Provider::OpenAi,
            });
        }
        let req = OpenAiChatRequest::new(&self.config, request)?;
        let url = self.endpoint("chat/completions");
        tracing::debug!(
            %url,
            model = %req.model,
            messages = req.messages.len(),
            "sending chat completion"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&req)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| LlmError::transport(Provider::OpenAi, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::transport(Provider::OpenAi, e))?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "openai chat completion rejected");
            return Err(LlmError::Api {
                provider: Provider::OpenAi,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Sends `prompt`, preceded by `system` when non-empty, and returns the
    /// first choice's text.
    pub async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let response = self
            .chat_completion(&ChatCompletionRequest::new(messages))
            .await?;
        Ok(response.first_content().to_string())
    }

    pub async fn complete_code(
        &self,
        code: &str,
        language: &str,
        context: Option<&str>,
    ) -> Result<String> {
        self.complete_template(prompts::complete_code(code, language, context))
            .await
    }

    pub async fn explain_code(&self, code: &str, language: &str) -> Result<String> {
        self.complete_template(prompts::explain_code(code, language))
            .await
    }

    pub async fn suggest_improvements(&self, code: &str, language: &str) -> Result<String> {
        self.complete_template(prompts::suggest_improvements(code, language))
            .await
    }

    pub async fn debug_code(&self, code: &str, error: &str, language: &str) -> Result<String> {
        self.complete_template(prompts::debug_code(code, error, language))
            .await
    }

    async fn complete_template(&self, template: PromptTemplate) -> Result<String> {
        self.complete(&template.prompt, Some(&template.system)).await
    }

    /// Lists models to confirm the key and endpoint work.
    #[tracing::instrument(level = "info", skip_all, fields(provider = "openai"))]
    pub async fn probe(&self) -> ProbeResult {
        if !self.is_configured() {
            return ProbeResult::failed(
                LlmError::NotConfigured {
                    provider: Provider::OpenAi,
                }
                .to_string(),
            );
        }

        let result = self
            .http
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout())
            .send()
            .await;

        match result {
            Ok(response) => probe_result_from_status(response.status()),
            Err(e) => {
                tracing::warn!(%e, "openai probe failed");
                ProbeResult::failed(e.to_string())
            }
        }
    }
}

pub(crate) fn probe_result_from_status(status: reqwest::StatusCode) -> ProbeResult {
    if status.is_success() {
        return ProbeResult::ok();
    }
    ProbeResult::failed(format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    ))
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: String,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

impl<'a> OpenAiChatRequest<'a> {
    fn new(config: &OpenAiConfig, request: &'a ChatCompletionRequest) -> Result<Self> {
        if request.stream == Some(true) {
            return Err(LlmError::InvalidInput(
                "streaming responses are not supported".to_string(),
            ));
        }
        Ok(Self {
            model: request
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| config.model.clone()),
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(config.temperature),
            max_tokens: request
                .max_tokens
                .filter(|&n| n > 0)
                .unwrap_or(config.max_tokens),
            stream: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str, api_key: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: api_key.to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: base_url.to_string(),
            timeout_ms: 5_000,
            max_tokens: 4000,
            temperature: 0.7,
        }
    }

    fn client(base_url: &str, api_key: &str) -> OpenAiClient {
        OpenAiClient::new(reqwest::Client::new(), config(base_url, api_key))
    }

    fn completion_body(contents: &[&str]) -> serde_json::Value {
        let choices: Vec<_> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| {
                json!({
                    "index": i,
                    "message": { "role": "assistant", "content": c },
                    "finish_reason": "stop"
                })
            })
            .collect();
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": choices,
            "usage": { "prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4 }
        })
    }

    #[test]
    fn request_layers_overrides_over_defaults() {
        let cfg = config("http://unused", "sk");
        let req = ChatCompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_model("gpt-4o")
            .with_temperature(0.0)
            .with_max_tokens(64);

        let wire = serde_json::to_value(OpenAiChatRequest::new(&cfg, &req).expect("valid"))
            .expect("serialize");
        assert_eq!(
            wire,
            json!({
                "model": "gpt-4o",
                "messages": [{ "role": "user", "content": "hi" }],
                "temperature": 0.0,
                "max_tokens": 64,
                "stream": false
            })
        );
    }

    #[test]
    fn request_falls_back_to_configured_defaults() {
        let cfg = config("http://unused", "sk");
        let req = ChatCompletionRequest {
            model: Some(String::new()),
            max_tokens: Some(0),
            ..ChatCompletionRequest::new(vec![ChatMessage::user("hi")])
        };

        let wire = OpenAiChatRequest::new(&cfg, &req).expect("valid");
        assert_eq!(wire.model, "gpt-4o-mini");
        assert_eq!(wire.max_tokens, 4000);
        assert_eq!(wire.temperature, 0.7);
        assert!(!wire.stream);
    }

    #[test]
    fn streaming_requests_are_rejected() {
        let cfg = config("http://unused", "sk");
        let req = ChatCompletionRequest {
            stream: Some(true),
            ..ChatCompletionRequest::new(vec![ChatMessage::user("hi")])
        };
        assert!(matches!(
            OpenAiChatRequest::new(&cfg, &req),
            Err(LlmError::InvalidInput(_))
        ));
    }

    #[test]
    fn status_reports_configuration() {
        let c = client("http://localhost:1/v1", "");
        assert!(!c.is_configured());
        assert_eq!(
            c.status(),
            OpenAiStatus {
                configured: false,
                model: "gpt-4o-mini".to_string(),
                base_url: "http://localhost:1/v1".to_string(),
            }
        );
        assert!(client("http://localhost:1/v1", "sk").is_configured());
    }

    #[tokio::test]
    async fn chat_completion_without_key_fails_before_network() {
        let server = MockServer::start().await;
        let c = client(&server.uri(), "");

        let err = c
            .chat_completion(&ChatCompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect_err("missing key must fail");
        assert_eq!(err.to_string(), "OpenAI API key not configured");
        assert!(
            server
                .received_requests()
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn chat_completion_posts_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({ "model": "gpt-4o-mini", "max_tokens": 4000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&["hello"])))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client(&server.uri(), "sk-test")
            .chat_completion(&ChatCompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect("completion succeeds");
        assert_eq!(resp.id, "chatcmpl-1");
        assert_eq!(resp.first_content(), "hello");
        assert_eq!(resp.usage.total_tokens, 4);
    }

    #[tokio::test]
    async fn chat_completion_surfaces_http_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client(&server.uri(), "sk-bad")
            .chat_completion(&ChatCompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect_err("401 must fail");
        let msg = err.to_string();
        assert!(msg.contains("401"), "{msg}");
        assert!(msg.contains("Unauthorized"), "{msg}");
        assert!(msg.contains("invalid api key"), "{msg}");
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn chat_completion_times_out_as_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body(&["late"]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut cfg = config(&server.uri(), "sk");
        cfg.timeout_ms = 50;
        let err = OpenAiClient::new(reqwest::Client::new(), cfg)
            .chat_completion(&ChatCompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .expect_err("timeout must fail");
        assert!(matches!(err, LlmError::Transport { .. }), "{err}");
        assert!(err.to_string().starts_with("OpenAI request failed:"));
    }

    #[tokio::test]
    async fn complete_returns_first_choice_or_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&["hello"])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&[])))
            .mount(&server)
            .await;

        let c = client(&server.uri(), "sk");
        assert_eq!(c.complete("hi", None).await.expect("first call"), "hello");
        assert_eq!(c.complete("hi", None).await.expect("second call"), "");
    }

    #[tokio::test]
    async fn complete_sends_system_message_first() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": "be terse" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&["ok"])))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server.uri(), "sk")
            .complete("hi", Some("be terse"))
            .await
            .expect("completion succeeds");
        assert_eq!(out, "ok");
    }

    #[tokio::test]
    async fn debug_code_uses_template() {
        let server = MockServer::start().await;
        let template = prompts::debug_code("x()", "x is undefined", "javascript");
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": template.system },
                    { "role": "user", "content": template.prompt }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&["fixed"])))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server.uri(), "sk")
            .debug_code("x()", "x is undefined", "javascript")
            .await
            .expect("completion succeeds");
        assert_eq!(out, "fixed");
    }

    #[tokio::test]
    async fn probe_without_key_skips_network() {
        let server = MockServer::start().await;
        let result = client(&server.uri(), "").probe().await;
        assert_eq!(result, ProbeResult::failed("OpenAI API key not configured"));
        assert!(
            server
                .received_requests()
                .await
                .unwrap_or_default()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn probe_lists_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(client(&server.uri(), "sk").probe().await, ProbeResult::ok());
    }

    #[tokio::test]
    async fn probe_reports_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        assert_eq!(
            client(&server.uri(), "sk").probe().await,
            ProbeResult::failed("HTTP 403: Forbidden")
        );
    }

    #[tokio::test]
    async fn probe_absorbs_transport_errors() {
        // Nothing listens on port 9 locally.
        let result = client("http://127.0.0.1:9", "sk").probe().await;
        assert!(!result.success);
        assert!(result.error.is_some_and(|e| !e.is_empty()));
    }
}
