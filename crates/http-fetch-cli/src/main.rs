//! http-fetch command line tool

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use http_fetch::{Advisory, FetchExecutor, ResponseState};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

use crate::cli::Cli;
use crate::config::Settings;

#[derive(Debug, Serialize)]
struct Output {
    state: ResponseState,
    warnings: Vec<Advisory>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let env_filter = EnvFilter::new(args.log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings =
        Settings::new(args.config.as_deref()).context("Could not load configuration")?;
    args.apply(&mut settings);
    tracing::debug!("Using settings: {:?}", settings);

    let spec = settings
        .request_spec()
        .ok_or_else(|| anyhow!("No URL given, use --url or set request.url"))?;
    let client = settings
        .http_client()
        .context("Could not build HTTP client")?;
    let executor = FetchExecutor::new(client).with_policy(settings.fetch_policy());

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, cancelling request");
                ctrl_c_token.cancel();
            }
            _ = ctrl_c_token.cancelled() => {}
        }
    });

    let result = executor.execute_with_cancel(&spec, &cancel_token).await;
    cancel_token.cancel();
    let outcome = result?;

    let output = Output {
        state: outcome.record.to_state(),
        warnings: outcome.warnings,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
