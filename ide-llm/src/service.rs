use crate::anthropic::AnthropicClient;
use crate::config::{AiApiConfig, ConfigSource, validate};
use crate::openai::OpenAiClient;
use crate::types::{ProbeResult, Provider};
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("ide-llm/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationStatus {
    pub openai: bool,
    pub anthropic: bool,
    pub google: bool,
    pub cohere: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub openai: ProbeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ProbeResult>,
    /// Follows the OpenAI probe only; it is the one required provider.
    pub overall: bool,
}

/// Entry point for the host application. Holds one configuration snapshot
/// and the provider clients built from it.
#[derive(Clone)]
pub struct AiApiService {
    config: AiApiConfig,
    openai: OpenAiClient,
    anthropic: AnthropicClient,
}

impl AiApiService {
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn new(config: AiApiConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(%e, "reqwest client build failed; falling back to default client");
                reqwest::Client::new()
            });
        Self::with_http(http, config)
    }

    pub fn with_http(http: reqwest::Client, config: AiApiConfig) -> Self {
        let validation = validate(&config);
        if !validation.valid {
            for key in &validation.missing {
                tracing::warn!(missing = %key, "AI API configuration issue");
            }
            tracing::warn!("please check your .env file configuration");
        }

        Self {
            openai: OpenAiClient::new(http.clone(), config.openai.clone()),
            anthropic: AnthropicClient::new(http, config.anthropic.clone()),
            config,
        }
    }

    pub fn from_source(source: &dyn ConfigSource) -> Self {
        Self::new(AiApiConfig::load(source))
    }

    /// Replaces the Anthropic client, e.g. to target a proxy endpoint.
    pub fn with_anthropic(mut self, anthropic: AnthropicClient) -> Self {
        self.anthropic = anthropic;
        self
    }

    pub fn config(&self) -> &AiApiConfig {
        &self.config
    }

    pub fn openai(&self) -> &OpenAiClient {
        &self.openai
    }

    pub fn anthropic(&self) -> &AnthropicClient {
        &self.anthropic
    }

    pub async fn test_openai_connection(&self) -> ProbeResult {
        self.openai.probe().await
    }

    pub async fn test_anthropic_connection(&self) -> ProbeResult {
        self.anthropic.probe().await
    }

    pub fn configuration_status(&self) -> ConfigurationStatus {
        let validation = validate(&self.config);
        ConfigurationStatus {
            openai: self.config.is_configured(Provider::OpenAi),
            anthropic: self.config.is_configured(Provider::Anthropic),
            google: self.config.is_configured(Provider::Google),
            cohere: self.config.is_configured(Provider::Cohere),
            warnings: validation.warnings(),
        }
    }

    /// Probes OpenAI, then Anthropic if its client has a key. Probes run one
    /// after the other.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn test_all_connections(&self) -> ConnectionReport {
        let openai = self.test_openai_connection().await;

        let anthropic = if self.anthropic.is_configured() {
            Some(self.test_anthropic_connection().await)
        } else {
            None
        };

        tracing::info!(
            openai = openai.success,
            anthropic = ?anthropic.as_ref().map(|r| r.success),
            "connection tests finished"
        );
        ConnectionReport {
            overall: openai.success,
            openai,
            anthropic,
        }
    }
}
