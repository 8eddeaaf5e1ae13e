// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use glyphgate_core::{ContentType, Sensitivity};

#[derive(Debug, Parser)]
#[command(name = "glyphgate", version, about = "Text gate for font identification uploads")]
pub struct Cli {
    /// Pipeline configuration file (JSON). Built-in defaults when absent.
    #[arg(long, global = true, env = "GLYPHGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct EngineArgs {
    /// External recognizer: invoked as `<PROGRAM> <ARGS…> <image.png>`, must
    /// print JSON on stdout.
    #[arg(long, global = true, env = "GLYPHGATE_ENGINE_CMD", value_name = "PROGRAM")]
    pub engine_cmd: Option<PathBuf>,

    /// Extra argument for the external recognizer (repeatable).
    #[arg(long = "engine-arg", global = true, allow_hyphen_values = true, value_name = "ARG")]
    pub engine_args: Vec<String>,

    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    #[cfg(feature = "ocrs")]
    #[arg(long, global = true, env = "GLYPHGATE_OCRS_MODELS", value_name = "DIR")]
    pub ocrs_models: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyse one image and print the result as JSON.
    ///
    /// Exit code: 0 accepted, 2 no usable text, 3 multiple fonts, 1 error.
    Analyze(AnalyzeArgs),
    /// Report recognition engine availability.
    Status {
        #[arg(long)]
        pretty: bool,
    },
    /// Print the built-in quality and multi-font preset tables.
    Presets {
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Image file (PNG, JPEG, WebP, …).
    pub image: PathBuf,

    /// Multi-font preset: strict, balanced or relaxed.
    #[arg(long)]
    pub sensitivity: Option<Sensitivity>,

    /// Quality preset: default, advertisement, document or book.
    #[arg(long)]
    pub content_type: Option<ContentType>,

    /// Print the full report (gate measurements, verdict statistics) instead
    /// of just the result.
    #[arg(long)]
    pub report: bool,

    #[arg(long)]
    pub pretty: bool,
}
