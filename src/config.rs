//! Run configuration, built once at startup and passed down.
//!
//! Values come from the [`Cli`] (which already folds in environment
//! variables) and, optionally, a YAML sources file:
//!
//! ```yaml
//! category_order: ["US News", "Autosport F1"]
//! sources:
//!   - url: https://www.autosport.com/rss/feed/f1
//!     label: Autosport F1
//!     kind: rss
//!   - url: https://newsapi.org/v2/top-headlines
//!     label: US News
//!     kind: newsapi
//!     params:
//!       country: us
//! ```

use crate::cli::{Cli, OutputMode};
use crate::error::RunError;
use crate::models::{SourceConfig, SourceKind};
use crate::sources::weather::{ONECALL_URL, WeatherSettings};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Dashboard file name when neither `--filename` nor `--dated` is given.
pub const DEFAULT_FILENAME: &str = "index.html";

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<SourceConfig>,
    pub category_order: Vec<String>,
    pub news_api_key: Option<String>,
    pub weather: WeatherSettings,
    pub output_dir: PathBuf,
    pub filename: String,
    pub mode: OutputMode,
    pub title: String,
    pub timeout: Duration,
    pub concurrency: usize,
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    category_order: Vec<String>,
    sources: Vec<SourceConfig>,
}

/// Load `.env` from the working directory, if there is one.
///
/// Variables already set in the environment win.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(_) => debug!("No .env file loaded"),
    }
}

/// The built-in source list used when no sources file is given.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::rss("https://www.autosport.com/rss/feed/f1", "Autosport F1"),
        SourceConfig::rss("https://edm.com/.rss/full/", "EDM News"),
        SourceConfig::rss("https://www.autosport.com/rss/feed/wrc", "WRC News"),
        SourceConfig::news_api("https://newsapi.org/v2/top-headlines", "US News")
            .with_param("country", "us"),
    ]
}

/// The built-in category display order.
pub fn default_category_order() -> Vec<String> {
    vec!["US News".to_string()]
}

/// `News_YYYY-MM-DD.html` for the given date.
pub fn dated_filename(date: NaiveDate) -> String {
    format!("News_{}.html", date.format("%Y-%m-%d"))
}

/// The conventional place to drop the dashboard when no directory is set.
pub fn default_output_dir() -> PathBuf {
    dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Build the configuration for a run on `today`.
    ///
    /// # Errors
    ///
    /// - [`RunError::Config`] if the sources file cannot be read or parsed,
    ///   a source URL is invalid, or no sources remain.
    /// - [`RunError::MissingApiKey`] if a sources file lists a NewsAPI source
    ///   but no key is set. The built-in list drops that source instead.
    pub fn from_cli(cli: Cli, today: NaiveDate) -> Result<Self, RunError> {
        let news_api_key = cli.news_api_key.filter(|k| !k.trim().is_empty());
        let weather_api_key = cli.weather_api_key.filter(|k| !k.trim().is_empty());

        let (sources, category_order) = match &cli.sources {
            Some(path) => {
                let (sources, order) = load_sources_file(path)?;
                if news_api_key.is_none() {
                    if let Some(source) = sources.iter().find(|s| s.kind == SourceKind::NewsApi) {
                        return Err(RunError::MissingApiKey {
                            source_label: source.label.clone(),
                        });
                    }
                }
                (sources, order)
            }
            None => {
                let mut sources = default_sources();
                if news_api_key.is_none() {
                    warn!("NEWS_API key not set; skipping NewsAPI sources");
                    sources.retain(|s| s.kind != SourceKind::NewsApi);
                }
                (sources, default_category_order())
            }
        };

        if sources.is_empty() {
            return Err(RunError::Config("no sources configured".to_string()));
        }
        for source in &sources {
            let url = Url::parse(&source.url).map_err(|e| {
                RunError::Config(format!("invalid url for {:?}: {e}", source.label))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(RunError::Config(format!(
                    "url for {:?} must be http or https, got {}",
                    source.label,
                    url.scheme()
                )));
            }
        }
        if weather_api_key.is_none() {
            warn!("WEATHER_API key not set; dashboard will render without weather");
        }

        let filename = match (cli.filename, cli.dated) {
            (Some(name), _) => name,
            (None, true) => dated_filename(today),
            (None, false) => DEFAULT_FILENAME.to_string(),
        };

        let config = Self {
            sources,
            category_order,
            news_api_key,
            weather: WeatherSettings {
                api_key: weather_api_key,
                endpoint: ONECALL_URL.to_string(),
                lat: cli.lat,
                lon: cli.lon,
                units: cli.units,
                location: cli.location,
            },
            output_dir: cli.output_dir.unwrap_or_else(default_output_dir),
            filename,
            mode: cli.mode,
            title: cli.title,
            timeout: Duration::from_secs(cli.timeout_secs.max(1)),
            concurrency: cli.concurrency.max(1),
        };
        info!(
            sources = config.sources.len(),
            output_dir = %config.output_dir.display(),
            filename = %config.filename,
            mode = ?config.mode,
            "Configuration loaded"
        );
        Ok(config)
    }
}

fn load_sources_file(path: &Path) -> Result<(Vec<SourceConfig>, Vec<String>), RunError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| RunError::Config(format!("cannot read {}: {e}", path.display())))?;
    let file: SourcesFile = serde_yaml::from_str(&contents)
        .map_err(|e| RunError::Config(format!("{} is not a valid sources file: {e}", path.display())))?;
    Ok((file.sources, file.category_order))
}
