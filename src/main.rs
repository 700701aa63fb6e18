//! Grid Schedule Parser
//!
//! Command line front end: reads a schedule screenshot, runs the parser with
//! the Tesseract engine, and prints the JSON result on stdout. Logs go to
//! stderr.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use grid_schedule_parser::ocr::TesseractRecognizer;
use grid_schedule_parser::{finalize, paths, GridScheduleParser, ParseResult, ParserConfig};

#[derive(Parser, Debug)]
#[command(
    name = "grid-schedule-parser",
    version,
    about = "Extracts weekly class blocks from calendar grid screenshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a schedule image and print the result as JSON
    Parse {
        /// Image file (PNG, JPEG, ...)
        image: PathBuf,

        /// Include the debug overlay in the output
        #[arg(long, default_value_t = false)]
        debug: bool,

        /// Also write the debug overlay PNG to this path (implies --debug)
        #[arg(long)]
        overlay_out: Option<PathBuf>,

        /// Config file (defaults to config.json next to the executable)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print single-line JSON
        #[arg(long, default_value_t = false)]
        compact: bool,
    },

    /// Report whether the text recognition engine is usable
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration to a file
    InitConfig {
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Parse {
            image,
            debug,
            overlay_out,
            config,
            compact,
        } => run_parse(&image, debug, overlay_out.as_deref(), config.as_deref(), compact),
        Command::Check { config } => run_check(config.as_deref()),
        Command::InitConfig { path } => run_init_config(&path),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Timestamped lines on stderr, `info` unless RUST_LOG says otherwise.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let timestamp = Local::now().format("%H:%M:%S%.3f");
            writeln!(buf, "[{}] {} {}", timestamp, record.level(), record.args())
        })
        .target(env_logger::Target::Stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> ParserConfig {
    match path {
        Some(path) => ParserConfig::load(path),
        None => ParserConfig::load(&paths::default_config_path()),
    }
}

/// Returns `Ok(false)` when a failure payload was printed.
fn run_parse(
    image: &Path,
    debug: bool,
    overlay_out: Option<&Path>,
    config: Option<&Path>,
    compact: bool,
) -> Result<bool> {
    let config = load_config(config);
    let debug = debug || overlay_out.is_some();

    let recognizer = match TesseractRecognizer::new(&config.ocr) {
        Ok(recognizer) => recognizer,
        Err(e) => {
            print_json(&ParseResult::failure(format!("Text recognition unavailable: {}", e)), compact)?;
            return Ok(false);
        }
    };

    let bytes = match std::fs::read(image) {
        Ok(bytes) => bytes,
        Err(e) => {
            print_json(
                &ParseResult::failure(format!("Failed to read {}: {}", image.display(), e)),
                compact,
            )?;
            return Ok(false);
        }
    };

    log::info!("Parsing {} ({} bytes)", image.display(), bytes.len());
    let parser = GridScheduleParser::new(config, recognizer);
    let result = match parser.parse(&bytes, debug) {
        Ok(result) => finalize(result),
        Err(e) => {
            print_json(&ParseResult::failure(e.to_string()), compact)?;
            return Ok(false);
        }
    };

    if let (Some(path), Some(overlay)) = (overlay_out, &result.debug) {
        let png = overlay.png_bytes()?;
        std::fs::write(path, png)
            .with_context(|| format!("Failed to write overlay to {}", path.display()))?;
        log::info!("Overlay saved to {}", path.display());
    }

    print_json(&result, compact)?;
    Ok(true)
}

fn run_check(config: Option<&Path>) -> Result<bool> {
    let config = load_config(config);
    let health = match TesseractRecognizer::new(&config.ocr).and_then(|r| r.check()) {
        Ok(version) => Health {
            status: "healthy",
            engine: Some(version),
            error: None,
        },
        Err(e) => Health {
            status: "unavailable",
            engine: None,
            error: Some(format!("{:#}", e)),
        },
    };
    let healthy = health.status == "healthy";
    print_json(&health, true)?;
    Ok(healthy)
}

fn run_init_config(path: &Path) -> Result<bool> {
    ParserConfig::save_default(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    log::info!("Default config written to {}", path.display());
    Ok(true)
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
