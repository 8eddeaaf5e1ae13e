// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyphgate — text gate for font identification uploads.
//
// Entry point. Initialises logging, parses arguments and dispatches to the
// subcommand.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "Glyphgate starting");

    match commands::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            commands::explain(&err);
            ExitCode::FAILURE
        }
    }
}
