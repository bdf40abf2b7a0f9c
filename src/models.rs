//! Data models shared by the fetchers, the aggregator and the renderer.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceConfig`]: A configured news source (RSS feed or NewsAPI endpoint)
//! - [`Entry`]: A normalized news item, whatever source it came from
//! - [`Weather`]: Current conditions and forecast, or the reason they are missing
//! - [`Dashboard`]: Everything a render pass needs, grouped by category

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Title used when a feed item carries a link but no title.
pub const UNTITLED: &str = "Untitled";

/// How a source must be fetched and parsed.
///
/// The kind is always configured explicitly; it is never guessed from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// An RSS 2.0 or Atom feed.
    Rss,
    /// A NewsAPI endpoint returning `{status, articles}` JSON.
    NewsApi,
}

/// A single configured news source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    /// Feed or endpoint URL.
    pub url: String,
    /// Human readable label, e.g. `"Autosport F1"`.
    pub label: String,
    /// Which parser handles this source.
    pub kind: SourceKind,
    /// Explicit grouping key. Defaults to the label.
    #[serde(default)]
    pub category: Option<String>,
    /// Extra query parameters sent with the request (e.g. `country=us`).
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl SourceConfig {
    pub fn rss(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            kind: SourceKind::Rss,
            category: None,
            params: BTreeMap::new(),
        }
    }

    pub fn news_api(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::NewsApi,
            ..Self::rss(url, label)
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The category this source's entries are grouped under.
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or(&self.label)
    }
}

/// Publication time of an entry, when the feed gave one we could read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    At(DateTime<FixedOffset>),
    Unknown,
}

impl fmt::Display for Published {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Published::At(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            Published::Unknown => f.write_str("unknown"),
        }
    }
}

/// A normalized news item.
///
/// `title` and `link` are never empty; the parsers drop items that cannot
/// satisfy this.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Headline, cleaned of markup.
    pub title: String,
    /// Absolute URL of the full article.
    pub link: String,
    /// Plain text summary, truncated. Empty when the item had no description.
    pub summary: String,
    /// Publication time or [`Published::Unknown`].
    pub published: Published,
    /// Display name of where the item came from.
    pub source_name: String,
    /// Grouping key, taken from the source configuration.
    pub category: String,
}

/// Current conditions as reported by the weather API.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Local observation time, `YYYY-MM-DD HH:MM`.
    pub observed_at: String,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u32,
    pub wind_speed: f64,
    /// Short condition group, e.g. `"Clouds"`.
    pub main: String,
    /// Longer description, e.g. `"broken clouds"`.
    pub description: String,
    /// Local sunrise time, `HH:MM`.
    pub sunrise: String,
    /// Local sunset time, `HH:MM`.
    pub sunset: String,
}

/// One day of the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Weekday name, e.g. `"Monday"`.
    pub day_name: String,
    pub main: String,
    pub description: String,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Probability of precipitation, 0.0 to 1.0.
    pub pop: f64,
    /// Rain volume in mm.
    pub rain: f64,
    /// Snow volume in mm.
    pub snow: f64,
}

/// Measurement system requested from the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// Value of the `units` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
        }
    }

    pub fn temp_symbol(&self) -> &'static str {
        match self {
            Units::Imperial => "°F",
            Units::Metric => "°C",
        }
    }

    pub fn speed_symbol(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric => "m/s",
        }
    }
}

/// Weather block shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSummary {
    pub location: String,
    pub units: Units,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastDay>,
}

/// Weather for this run, or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum Weather {
    Available(WeatherSummary),
    Unavailable { reason: String },
}

impl Weather {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Weather::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Weather::Available(_))
    }
}

/// All entries of one category, in feed order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub name: String,
    pub entries: Vec<Entry>,
}

/// Everything a render pass needs.
///
/// Rendering is a pure function of this value.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Page title.
    pub title: String,
    /// Footer timestamp, already formatted.
    pub generated_at: String,
    /// Categories in display order.
    pub groups: Vec<CategoryGroup>,
    pub weather: Weather,
}

impl Dashboard {
    /// Number of news entries across all categories.
    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    /// Whether there is anything worth publishing: at least one entry or
    /// the weather.
    pub fn is_renderable(&self) -> bool {
        self.entry_count() > 0 || self.weather.is_available()
    }
}
