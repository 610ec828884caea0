//! Subcommand handlers for `ide-ai`.

use crate::check::{self, CheckReport};
use anyhow::Result;
use clap::ValueEnum;
use ide_llm::{AiApiService, ConfigSource, ConfigurationStatus, OpenAiStatus};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodeTask {
    /// Continue the code in the file.
    Complete,
    /// Explain what the code does.
    Explain,
    /// Review the code and suggest improvements.
    Improve,
    /// Help fix an error (requires --error).
    Debug,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    configuration: ConfigurationStatus,
    openai: OpenAiStatus,
    general: &'a ide_llm::GeneralConfig,
}

pub async fn check(service: &AiApiService, source: &dyn ConfigSource) -> Result<ExitCode> {
    let report = CheckReport::inspect(source);
    print!("{}", report.render());

    if report.has_errors() {
        return Ok(ExitCode::FAILURE);
    }

    println!("\nTesting OpenAI API connection...");
    let result = service.test_openai_connection().await;
    println!("{}", check::render_probe("OpenAI", &result));
    Ok(ExitCode::SUCCESS)
}

pub fn status(service: &AiApiService) -> Result<ExitCode> {
    let report = StatusReport {
        configuration: service.configuration_status(),
        openai: service.openai().status(),
        general: &service.config().general,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

pub async fn probe(service: &AiApiService) -> Result<ExitCode> {
    let report = service.test_all_connections().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.overall {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn complete(
    service: &AiApiService,
    prompt: &str,
    system: Option<&str>,
) -> Result<ExitCode> {
    let text = service.openai().complete(prompt, system).await?;
    println!("{text}");
    Ok(ExitCode::SUCCESS)
}

pub async fn code(
    service: &AiApiService,
    task: CodeTask,
    file: &Path,
    language: &str,
    context: Option<&str>,
    error: Option<&str>,
) -> Result<ExitCode> {
    let code = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow::anyhow!("read {}: {e}", file.display()))?;
    let openai = service.openai();

    let text = match task {
        CodeTask::Complete => openai.complete_code(&code, language, context).await?,
        CodeTask::Explain => openai.explain_code(&code, language).await?,
        CodeTask::Improve => openai.suggest_improvements(&code, language).await?,
        CodeTask::Debug => {
            let error = error.ok_or_else(|| anyhow::anyhow!("--error is required for debug"))?;
            openai.debug_code(&code, error, language).await?
        }
    };
    println!("{text}");
    Ok(ExitCode::SUCCESS)
}
