// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations. Results go to stdout as JSON; logs and
// human-readable explanations go to stderr.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use glyphgate_core::error::{GlyphgateError, Result};
use glyphgate_core::human_errors::humanize_error;
use glyphgate_core::{
    AnalysisOptions, ContentType, MultiFontConfig, Outcome, PipelineConfig, QualityConfig,
    Sensitivity,
};
use glyphgate_ocr::{CommandEngine, Pipeline, RecognitionEngine, RecognitionWorker};
use glyphgate_vision::ImageProcessor;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{AnalyzeArgs, Cli, Command, EngineArgs};

const EXIT_NO_TEXT: u8 = 2;
const EXIT_MULTIPLE_FONTS: u8 = 3;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Analyze(args) => analyze(cli.config.as_deref(), &cli.engine, args).await,
        Command::Status { pretty } => status(cli.config.as_deref(), &cli.engine, pretty),
        Command::Presets { pretty } => presets(pretty),
    }
}

/// Print the plain-language form of an error on stderr.
pub fn explain(err: &GlyphgateError) {
    let human = humanize_error(err);
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
}

async fn analyze(config: Option<&Path>, engine: &EngineArgs, args: AnalyzeArgs) -> Result<ExitCode> {
    let config = load_config(config)?;
    let image = ImageProcessor::open(&args.image)?.into_dynamic();
    let worker = RecognitionWorker::spawn(build_engine(engine)?, Pipeline::new(config)?)?;

    let options = AnalysisOptions {
        content_type: args.content_type,
        sensitivity: args.sensitivity,
    };
    let outcome = worker.submit(image, options).await;
    worker.shutdown();
    let report = outcome?;

    let json = if args.report {
        to_json(&report, args.pretty)?
    } else {
        to_json(&report.result, args.pretty)?
    };
    println!("{json}");

    let code = match report.result.outcome() {
        Outcome::Accepted => ExitCode::SUCCESS,
        Outcome::NoText => ExitCode::from(EXIT_NO_TEXT),
        Outcome::MultipleFonts => ExitCode::from(EXIT_MULTIPLE_FONTS),
    };
    if let Err(refusal) = report.result.into_gate() {
        explain(&refusal);
    }
    Ok(code)
}

fn status(config: Option<&Path>, engine: &EngineArgs, pretty: bool) -> Result<ExitCode> {
    let config = load_config(config)?;
    let worker = RecognitionWorker::spawn(build_engine(engine)?, Pipeline::new(config)?)?;
    let status = worker.status();
    worker.shutdown();

    println!("{}", to_json(&status, pretty)?);
    if status.available {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(engine = %status.engine, "Recognition engine unavailable");
        Ok(ExitCode::FAILURE)
    }
}

#[derive(Serialize)]
struct PresetTable {
    quality: BTreeMap<&'static str, QualityConfig>,
    multi_font: BTreeMap<&'static str, MultiFontConfig>,
}

fn presets(pretty: bool) -> Result<ExitCode> {
    let table = PresetTable {
        quality: ContentType::ALL
            .into_iter()
            .map(|content| (content.name(), QualityConfig::for_content(content)))
            .collect(),
        multi_font: Sensitivity::ALL
            .into_iter()
            .map(|sensitivity| (sensitivity.name(), MultiFontConfig::preset(sensitivity)))
            .collect(),
    };
    println!("{}", to_json(&table, pretty)?);
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::from_json_file(path)?;
            info!(path = %path.display(), "Configuration loaded");
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn build_engine(args: &EngineArgs) -> Result<Box<dyn RecognitionEngine>> {
    if let Some(program) = &args.engine_cmd {
        return Ok(Box::new(CommandEngine::new(program, args.engine_args.clone())));
    }

    default_engine(args)
}

#[cfg(feature = "ocrs")]
fn default_engine(args: &EngineArgs) -> Result<Box<dyn RecognitionEngine>> {
    use glyphgate_ocr::{OcrModelConfig, OcrsEngine};
    let models = match &args.ocrs_models {
        Some(dir) => OcrModelConfig::from_dir(dir),
        None => OcrModelConfig::default(),
    };
    Ok(Box::new(OcrsEngine::new(models)))
}

#[cfg(not(feature = "ocrs"))]
fn default_engine(_args: &EngineArgs) -> Result<Box<dyn RecognitionEngine>> {
    Err(GlyphgateError::EngineUnavailable(
        "no recognition engine configured; pass --engine-cmd or build with the `ocrs` feature"
            .into(),
    ))
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_table_lists_every_preset() {
        let table = PresetTable {
            quality: ContentType::ALL
                .into_iter()
                .map(|c| (c.name(), QualityConfig::for_content(c)))
                .collect(),
            multi_font: Sensitivity::ALL
                .into_iter()
                .map(|s| (s.name(), MultiFontConfig::preset(s)))
                .collect(),
        };
        let json: serde_json::Value = serde_json::from_str(&to_json(&table, false).unwrap()).unwrap();
        assert_eq!(json["quality"].as_object().unwrap().len(), ContentType::ALL.len());
        assert!(json["multi_font"]["relaxed"]["area_ratio_threshold"].is_number());
    }

    #[test]
    fn missing_engine_is_reported() {
        let args = EngineArgs {
            engine_cmd: None,
            engine_args: Vec::new(),
            #[cfg(feature = "ocrs")]
            ocrs_models: Some("/nonexistent/models".into()),
        };
        match build_engine(&args) {
            Err(err) => assert!(matches!(err, GlyphgateError::EngineUnavailable(_))),
            Ok(engine) => assert!(!engine.is_available()),
        }
    }
}
