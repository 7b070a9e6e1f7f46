//! Cardioscreen: heart disease screening from clinical measurements.
//!
//! Main entry point. Without arguments this runs the terminal intake form;
//! `--record <file.json>` assesses one serialized record and exits.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardioscreen::adapters::sanitize::SanitizingMakeWriter;
use cardioscreen::application::ConfiguredPredictor;
use cardioscreen::config::{LogMode, Settings};
use cardioscreen::domain::ADVISORY_NOTE;
use cardioscreen::tui::App;
use cardioscreen::ClinicalRecord;

fn usage() -> &'static str {
    "Usage: cardioscreen [--record <file.json>]"
}

fn parse_args() -> Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next(), args.next()) {
        (None, _, _) => Ok(None),
        (Some("--record"), Some(path), None) => Ok(Some(PathBuf::from(path))),
        (Some("-h" | "--help"), None, None) => {
            println!("{}", usage());
            std::process::exit(0);
        }
        _ => bail!(usage()),
    }
}

fn main() -> Result<()> {
    let record_path = parse_args()?;
    let settings = Settings::from_env()?;

    // Logging must stay off the terminal while the TUI owns it.
    let interactive = record_path.is_none() && std::io::stdout().is_terminal();
    let use_file = match settings.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => interactive,
    };

    let (writer, _guard) = if use_file {
        if let Some(parent) = settings.log_file.parent() {
            // Best-effort: a missing directory surfaces on open below.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)
            .with_context(|| format!("Cannot open log file {:?}", settings.log_file))?;
        tracing_appender::non_blocking(file)
    } else if record_path.is_some() {
        // stdout carries the verdict in record mode.
        tracing_appender::non_blocking(std::io::stderr())
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting cardioscreen...");

    let predictor = ConfiguredPredictor::from_settings(&settings)
        .map_err(|e| anyhow!("Failed to initialize predictor from {:?}: {e}", settings.model_path))?;

    match record_path {
        Some(path) => assess_file(&predictor, &path)?,
        None => App::new(predictor).run()?,
    }

    tracing::info!("cardioscreen shutdown complete.");
    Ok(())
}

fn assess_file(predictor: &ConfiguredPredictor, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path:?}"))?;
    let record: ClinicalRecord =
        serde_json::from_str(&raw).with_context(|| format!("Invalid record in {path:?}"))?;

    let prediction = predictor.assess(&record)?;
    println!("{}", prediction.message());
    println!("label={}", prediction.label());
    println!("{ADVISORY_NOTE}");
    Ok(())
}
