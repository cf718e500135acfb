mod cli;
mod config;
mod error;
mod lifecycle;
mod orchestrator;
mod provider;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use config::CallwatchConfig;
use error::CallwatchError;
use orchestrator::CallOrchestrator;
use provider::{CallHandle, CallProvider, TwilioClient};
use tracing_subscriber::EnvFilter;
use ui::CallProgress;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "callwatch=debug,warn" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// Exit code of a failed run; errors without a typed cause map to 1.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<CallwatchError>()
        .map(CallwatchError::exit_code)
        .unwrap_or(1)
}

fn load_config(path: Option<&std::path::Path>) -> Result<CallwatchConfig> {
    match path {
        Some(path) => CallwatchConfig::load_from(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => CallwatchConfig::load().context("failed to load callwatch.toml"),
    }
}

fn build_orchestrator(config: &CallwatchConfig) -> Result<CallOrchestrator<TwilioClient>, CallwatchError> {
    Ok(CallOrchestrator::new(
        config.client()?,
        config.poll(),
        config.output_path.clone(),
        config.recording_format,
    ))
}

async fn run(cli: Cli) -> Result<u8> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Call { call, retrieval } => {
            retrieval.apply(&mut config);
            let req = call.to_request(&config);
            let orch = build_orchestrator(&config)?;

            let progress = CallProgress::start(&format!("Calling {}", req.to));
            let report = match orch.run(&req, &progress).await {
                Ok(report) => report,
                Err(e) => {
                    progress.abort();
                    return Err(e.into());
                }
            };
            if retrieval.audit {
                progress.print_audit(&report.audit)?;
            }
            Ok(report.outcome.exit_code())
        }
        Command::Status { call_sid } => {
            let orch = build_orchestrator(&config)?;
            let call = CallHandle::new(call_sid).map_err(CallwatchError::from)?;
            let details = orch
                .provider()
                .fetch_call(&call)
                .await
                .map_err(CallwatchError::from)?;
            println!("Call {call} status: {}", details.status);
            Ok(0)
        }
        Command::Recordings { call_sid } => {
            let orch = build_orchestrator(&config)?;
            let call = CallHandle::new(call_sid).map_err(CallwatchError::from)?;
            let recordings = orch
                .provider()
                .list_recordings(&call)
                .await
                .map_err(CallwatchError::from)?;
            if recordings.is_empty() {
                println!("No recording found for this call.");
                return Ok(2);
            }
            for rec in &recordings {
                let duration = rec
                    .duration_secs
                    .map(|d| format!("{d}s"))
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{duration}\t{}", rec.sid, rec.uri);
            }
            Ok(0)
        }
        Command::Download { call_sid, retrieval } => {
            retrieval.apply(&mut config);
            let call = CallHandle::new(call_sid).map_err(CallwatchError::from)?;
            let orch = build_orchestrator(&config)?;

            let progress = CallProgress::start(&format!("Checking {call}"));
            let report = match orch.retrieve(call, &progress).await {
                Ok(report) => report,
                Err(e) => {
                    progress.abort();
                    return Err(e.into());
                }
            };
            if retrieval.audit {
                progress.print_audit(&report.audit)?;
            }
            Ok(report.outcome.exit_code())
        }
    }
}
