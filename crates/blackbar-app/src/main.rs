// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blackbar — irreversible PDF redaction
//
// Entry point. Initialises logging and configuration, then dispatches to the
// requested subcommand.

mod cli;
mod commands;
mod input;

use std::process::ExitCode;

use blackbar_core::RedactConfig;
use blackbar_core::error::Result;
use blackbar_core::human_errors::humanize_error;
use clap::Parser;
use tracing::{error, warn};

use cli::{Cli, Command};
use commands::{PreviewArgs, RedactArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Blackbar starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("       {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Info { file, json } => commands::info(&config, file, *json).await,
        Command::Redact {
            file,
            output,
            mode,
            scale,
            regions,
        } => {
            commands::redact(
                &config,
                RedactArgs {
                    file,
                    output,
                    mode: mode.as_deref(),
                    scale: *scale,
                    regions,
                },
            )
            .await
        }
        Command::Preview {
            file,
            page,
            output,
            scale,
            regions,
        } => {
            commands::preview(
                &config,
                PreviewArgs {
                    file,
                    page: *page,
                    output,
                    scale: *scale,
                    regions,
                },
            )
            .await
        }
    }
}

/// Explicit config file if given; defaults otherwise.
fn load_config(path: Option<&std::path::Path>) -> Result<RedactConfig> {
    match path {
        Some(path) => RedactConfig::from_json_file(path),
        None => Ok(RedactConfig::default()),
    }
    .inspect_err(|e| warn!(error = %e, "Could not load configuration"))
}
