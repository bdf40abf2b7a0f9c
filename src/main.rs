//! # News Dashboard
//!
//! Fetches headlines from RSS/Atom feeds and NewsAPI, plus an optional
//! OpenWeather forecast, and renders them into static HTML pages.
//!
//! ## Features
//!
//! - Any number of RSS 2.0 or Atom feeds, grouped into categories
//! - NewsAPI top headlines and everything queries
//! - Current conditions and a five day forecast from OpenWeather One Call
//! - A single self-contained page, or a dashboard plus one page per category
//!
//! ## Usage
//!
//! ```sh
//! NEWS_API=... WEATHER_API=... news_dashboard -o ~/Desktop --dated
//! news_dashboard -s sources.yaml --mode multi -o ./site
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: CLI flags, environment and an optional sources file
//! 2. **Fetching**: every source in configured order; failures are skipped
//! 3. **Grouping**: entries are grouped into categories in display order
//! 4. **Output**: pages are rendered in memory, then written atomically

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod sources;
mod utils;

use cli::Cli;
use config::{Config, load_dotenv};
use error::RunError;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_dashboard starting up");

    // Environment first, so clap sees .env values
    load_dotenv();
    let args = Cli::parse();
    debug!(?args.output_dir, ?args.sources, mode = ?args.mode, "Parsed CLI arguments");

    let config = Config::from_cli(args, Local::now().date_naive()).inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;

    // Early check: output dir must exist and be writable before any fetching
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(RunError::OutputDir {
            path: config.output_dir.clone(),
            error: e,
        }
        .into());
    }

    let client = sources::build_client(config.timeout)?;
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let dashboard = aggregator::aggregate(&client, &config, generated_at).await;

    let written = outputs::writer::write_site(
        &dashboard,
        &config.output_dir,
        &config.filename,
        config.mode,
    )
    .await?;

    let elapsed = start_time.elapsed();
    info!(
        pages = written.len(),
        entries = dashboard.entry_count(),
        elapsed_secs = elapsed.as_secs_f64(),
        "news_dashboard finished"
    );
    for path in &written {
        info!(path = %path.display(), "Output");
    }

    Ok(())
}
