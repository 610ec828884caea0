//! `ide-ai`: configuration and connectivity checks for the editor's AI providers.

mod check;
mod commands;
mod env_file;

use clap::{Parser, Subcommand};
use commands::CodeTask;
use env_file::EnvFileSource;
use ide_llm::{AiApiConfig, AiApiService, flag_enabled, vars};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ide-ai", version, about = "AI provider diagnostics for the editor")]
struct Cli {
    /// Env file layered under the process environment.
    #[arg(long, global = true, default_value = ".env", env = "IDE_AI_ENV_FILE")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report which variables are set and test the OpenAI connection (default).
    Check,
    /// Print configuration status as JSON.
    Status,
    /// Test every configured provider connection.
    Probe,
    /// Send a single prompt to OpenAI.
    Complete {
        prompt: String,
        #[arg(long)]
        system: Option<String>,
    },
    /// Run a code assistance prompt over a file.
    Code {
        #[arg(value_enum)]
        task: CodeTask,
        file: PathBuf,
        #[arg(long)]
        language: String,
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        error: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let source = EnvFileSource::load(&cli.env_file)?;
    let debug_requests = flag_enabled(&source, vars::DEBUG_AI_REQUESTS);
    init_tracing(debug_requests)?;
    install_panic_hook();

    let config = AiApiConfig::load(&source);
    let service = AiApiService::new(config);

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => commands::check(&service, &source).await,
        Command::Status => commands::status(&service),
        Command::Probe => commands::probe(&service).await,
        Command::Complete { prompt, system } => {
            commands::complete(&service, &prompt, system.as_deref()).await
        }
        Command::Code {
            task,
            file,
            language,
            context,
            error,
        } => {
            commands::code(
                &service,
                task,
                &file,
                &language,
                context.as_deref(),
                error.as_deref(),
            )
            .await
        }
    }
}

fn init_tracing(debug_requests: bool) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) if debug_requests => EnvFilter::new("warn,ide_ai=debug,ide_llm=debug"),
        Err(_) => EnvFilter::new("warn,ide_ai=info,ide_llm=warn"),
    };
    let log_format = std::env::var("IDE_AI_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match log_format.as_str() {
        "compact" => builder.compact().init(),
        "pretty" => builder.pretty().init(),
        "json" => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init(),
        other => {
            return Err(anyhow::anyhow!(
                "unsupported IDE_AI_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(
        log_format = %log_format,
        debug_requests,
        "tracing initialized"
    );
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
