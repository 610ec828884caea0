//! Environment report printed by `ide-ai check`.

use ide_llm::{ConfigSource, ProbeResult, vars};
use std::fmt::Write as _;

const REQUIRED_KEYS: &[&str] = &[vars::OPENAI_API_KEY];

const OPTIONAL_KEYS: &[&str] = &[
    vars::OPENAI_MODEL,
    vars::ANTHROPIC_API_KEY,
    vars::GOOGLE_AI_API_KEY,
    vars::COHERE_API_KEY,
    vars::AI_ENGINE_TIMEOUT,
    vars::AI_ENGINE_MAX_TOKENS,
];

/// Characters of a secret shown in reports.
const KEY_PREFIX_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarReport {
    pub name: &'static str,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub required: Vec<VarReport>,
    pub optional: Vec<VarReport>,
}

impl CheckReport {
    pub fn inspect(source: &dyn ConfigSource) -> Self {
        let read = |names: &[&'static str]| -> Vec<VarReport> {
            names
                .iter()
                .map(|&name| VarReport {
                    name,
                    value: source.var(name).filter(|v| !v.is_empty()),
                })
                .collect()
        };
        Self {
            required: read(REQUIRED_KEYS),
            optional: read(OPTIONAL_KEYS),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.required.iter().any(|v| v.value.is_none())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Required API keys:\n");
        for var in &self.required {
            match &var.value {
                Some(v) => {
                    let _ = writeln!(out, "  [ok]      {}: configured ({}...)", var.name, mask(v));
                }
                None => {
                    let _ = writeln!(out, "  [missing] {}: missing", var.name);
                }
            }
        }

        out.push_str("\nOptional configuration:\n");
        for var in &self.optional {
            match &var.value {
                // Optional provider keys are secrets too.
                Some(v) if var.name.ends_with("_API_KEY") => {
                    let _ = writeln!(out, "  [ok]      {}: configured ({}...)", var.name, mask(v));
                }
                Some(v) => {
                    let _ = writeln!(out, "  [ok]      {}: {v}", var.name);
                }
                None => {
                    let _ = writeln!(out, "  [default] {}: not set (using default)", var.name);
                }
            }
        }

        out.push_str("\nConfiguration status:\n");
        if self.has_errors() {
            out.push_str("  configuration incomplete\n");
            out.push_str("  to fix: copy .env.example to .env, add your API keys, and run this check again\n");
        } else {
            out.push_str("  configuration looks good\n");
        }
        out
    }
}

pub fn render_probe(provider: &str, result: &ProbeResult) -> String {
    match &result.error {
        None if result.success => format!("{provider} API: connection successful"),
        Some(e) => format!("{provider} API: {e}"),
        None => format!("{provider} API: connection failed"),
    }
}

fn mask(secret: &str) -> String {
    secret.chars().take(KEY_PREFIX_CHARS).collect()
}
