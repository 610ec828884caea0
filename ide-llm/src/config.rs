//! Provider configuration resolved from environment variables.

use crate::types::Provider;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: u32 = 5;

/// Variable names read by [`AiApiConfig::load`].
pub mod vars {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
    pub const GOOGLE_AI_API_KEY: &str = "GOOGLE_AI_API_KEY";
    pub const COHERE_API_KEY: &str = "COHERE_API_KEY";
    pub const AI_ENGINE_TIMEOUT: &str = "AI_ENGINE_TIMEOUT";
    pub const AI_ENGINE_MAX_TOKENS: &str = "AI_ENGINE_MAX_TOKENS";
    pub const AI_ENGINE_TEMPERATURE: &str = "AI_ENGINE_TEMPERATURE";
    pub const AI_CACHE_ENABLED: &str = "AI_CACHE_ENABLED";
    pub const AI_CACHE_TTL: &str = "AI_CACHE_TTL";
    pub const MAX_CONCURRENT_AI_REQUESTS: &str = "MAX_CONCURRENT_AI_REQUESTS";
    pub const DEBUG_AI_REQUESTS: &str = "DEBUG_AI_REQUESTS";
}

/// A read-only mapping from variable name to value.
pub trait ConfigSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<S: ConfigSource + ?Sized> ConfigSource for &S {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiConfig {
    #[serde(skip)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicConfig {
    #[serde(skip)]
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Providers that are configured but have no client yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyOnlyConfig {
    #[serde(skip)]
    pub api_key: String,
    pub timeout_ms: u64,
}

/// Cross-cutting toggles. Carried for collaborators; nothing in this crate
/// enforces caching or a concurrency limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneralConfig {
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub max_concurrent_requests: u32,
    pub debug_requests: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiApiConfig {
    pub openai: OpenAiConfig,
    pub anthropic: AnthropicConfig,
    pub google: KeyOnlyConfig,
    pub cohere: KeyOnlyConfig,
    pub general: GeneralConfig,
}

impl AiApiConfig {
    /// Resolves every provider's settings from `source`.
    ///
    /// Unset and empty variables take their defaults. Call again to pick up
    /// changes; nothing is cached.
    pub fn load(source: &dyn ConfigSource) -> Self {
        let r = Resolver { source };
        let timeout_ms = r.number(vars::AI_ENGINE_TIMEOUT, DEFAULT_TIMEOUT_MS);
        let max_tokens = r.number(vars::AI_ENGINE_MAX_TOKENS, DEFAULT_MAX_TOKENS);
        let temperature = r.float(vars::AI_ENGINE_TEMPERATURE, DEFAULT_TEMPERATURE);

        Self {
            openai: OpenAiConfig {
                api_key: r.string(vars::OPENAI_API_KEY, ""),
                model: r.string(vars::OPENAI_MODEL, DEFAULT_OPENAI_MODEL),
                base_url: r.string(vars::OPENAI_BASE_URL, DEFAULT_OPENAI_BASE_URL),
                timeout_ms,
                max_tokens,
                temperature,
            },
            anthropic: AnthropicConfig {
                api_key: r.string(vars::ANTHROPIC_API_KEY, ""),
                model: r.string(vars::ANTHROPIC_MODEL, DEFAULT_ANTHROPIC_MODEL),
                timeout_ms,
                max_tokens,
                temperature,
            },
            google: KeyOnlyConfig {
                api_key: r.string(vars::GOOGLE_AI_API_KEY, ""),
                timeout_ms,
            },
            cohere: KeyOnlyConfig {
                api_key: r.string(vars::COHERE_API_KEY, ""),
                timeout_ms,
            },
            general: GeneralConfig {
                cache_enabled: r.flag(vars::AI_CACHE_ENABLED),
                cache_ttl_secs: r.number(vars::AI_CACHE_TTL, DEFAULT_CACHE_TTL_SECS),
                max_concurrent_requests: r.number(
                    vars::MAX_CONCURRENT_AI_REQUESTS,
                    DEFAULT_MAX_CONCURRENT_REQUESTS,
                ),
                debug_requests: r.flag(vars::DEBUG_AI_REQUESTS),
            },
        }
    }

    pub fn from_env() -> Self {
        Self::load(&ProcessEnv)
    }

    /// Like [`AiApiConfig::load`], but logs a warning when required keys are missing.
    pub fn load_with_warnings(source: &dyn ConfigSource) -> Self {
        let config = Self::load(source);
        let validation = validate(&config);
        if !validation.valid {
            tracing::warn!(
                missing = %validation.missing.join(", "),
                "missing API keys; some AI features may not work, check your .env file"
            );
        }
        config
    }

    pub fn api_key(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai.api_key,
            Provider::Anthropic => &self.anthropic.api_key,
            Provider::Google => &self.google.api_key,
            Provider::Cohere => &self.cohere.api_key,
        }
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        !self.api_key(provider).is_empty()
    }
}

/// Boolean settings are on only when the value is exactly `true`.
pub fn flag_enabled(source: &dyn ConfigSource, name: &str) -> bool {
    source.var(name).as_deref() == Some("true")
}

struct Resolver<'a> {
    source: &'a dyn ConfigSource,
}

impl Resolver<'_> {
    fn raw(&self, name: &str) -> Option<String> {
        self.source.var(name).filter(|v| !v.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, name: &str) -> bool {
        flag_enabled(self.source, name)
    }

    /// Like `number`, but NaN and infinities count as unparseable.
    fn float(&self, name: &str, default: f64) -> f64 {
        let v = self.number(name, default);
        if v.is_finite() {
            return v;
        }
        tracing::warn!(
            variable = name,
            default = %default,
            "ignoring non-finite numeric setting"
        );
        default
    }

    fn number<T>(&self, name: &str, default: T) -> T
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.raw(name) else {
            return default;
        };
        match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    variable = name,
                    value = %raw,
                    default = %default,
                    "ignoring unparseable numeric setting"
                );
                default
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Names of the missing variables, e.g. `OPENAI_API_KEY`.
    pub missing: Vec<String>,
}

impl ValidationResult {
    pub fn warnings(&self) -> Vec<String> {
        self.missing.iter().map(|k| format!("Missing {k}")).collect()
    }
}

/// Reports required credentials that are absent. Only OpenAI is required;
/// the other providers are optional and never make a config invalid.
pub fn validate(config: &AiApiConfig) -> ValidationResult {
    let mut missing = Vec::new();
    if config.openai.api_key.is_empty() {
        missing.push(vars::OPENAI_API_KEY.to_string());
    }
    ValidationResult {
        valid: missing.is_empty(),
        missing,
    }
}
