//! Provider clients for the editor's AI features.
//!
//! Pure HTTP client layer: configuration is resolved from environment
//! variables, requests go straight to the provider APIs.

mod anthropic;
mod config;
mod error;
mod openai;
pub mod prompts;
mod service;
mod types;

pub use anthropic::AnthropicClient;
pub use config::{
    AiApiConfig, AnthropicConfig, ConfigSource, GeneralConfig, KeyOnlyConfig, OpenAiConfig,
    ProcessEnv, ValidationResult, flag_enabled, validate, vars,
};
pub use error::{LlmError, Result};
pub use openai::{OpenAiClient, OpenAiStatus};
pub use service::{AiApiService, ConfigurationStatus, ConnectionReport};
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, ProbeResult, Provider,
    Role, Usage,
};
