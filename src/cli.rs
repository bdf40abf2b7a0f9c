//! Command-line interface definitions for the news dashboard.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option can also be provided through an environment variable (or a
//! `.env` file), so a scheduled run needs no arguments at all.

use crate::models::Units;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How the rendered output is split into files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// One page with the weather and every category.
    #[default]
    Single,
    /// A dashboard page plus one page per category.
    Multi,
}

/// Command-line arguments for the news dashboard.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment
/// NEWS_API=... WEATHER_API=... OUTPUT_DIR=/var/www/html news_dashboard
///
/// # Per-category pages with a custom source list
/// news_dashboard -o ./site --mode multi -s sources.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// NewsAPI key
    #[arg(long, env = "NEWS_API", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// OpenWeather API key
    #[arg(long, env = "WEATHER_API", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    /// Output directory for the HTML files (defaults to the Desktop)
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Dashboard file name
    #[arg(short, long, env = "OUTPUT_FILENAME")]
    pub filename: Option<String>,

    /// Name the dashboard News_YYYY-MM-DD.html instead of index.html
    #[arg(long, env = "OUTPUT_DATED", conflicts_with = "filename")]
    pub dated: bool,

    /// Single page, or dashboard plus per-category pages
    #[arg(long, env = "OUTPUT_MODE", value_enum, default_value_t = OutputMode::Single)]
    pub mode: OutputMode,

    /// Page title
    #[arg(long, env = "DASHBOARD_TITLE", default_value = "Daily News Dashboard")]
    pub title: String,

    /// YAML file listing sources and category order
    #[arg(short, long, env = "SOURCES_FILE")]
    pub sources: Option<PathBuf>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Number of sources fetched at once (results keep configured order)
    #[arg(long, env = "FETCH_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// Weather latitude
    #[arg(long, env = "WEATHER_LAT", default_value_t = 40.489632, allow_negative_numbers = true)]
    pub lat: f64,

    /// Weather longitude
    #[arg(long, env = "WEATHER_LON", default_value_t = -111.940018, allow_negative_numbers = true)]
    pub lon: f64,

    /// Weather units
    #[arg(long, env = "WEATHER_UNITS", value_enum, default_value_t = Units::Imperial)]
    pub units: Units,

    /// Weather location label (defaults to the API's timezone name)
    #[arg(long, env = "WEATHER_LOCATION")]
    pub location: Option<String>,
}
