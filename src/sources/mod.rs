//! News and weather sources.
//!
//! Each source module has two halves: a pure `parse_*` function that turns a
//! response body into models, and an async `fetch_*` function that performs
//! the HTTP request and hands the body to the parser.
//!
//! # Supported Sources
//!
//! | Source | Module | Format | Notes |
//! |--------|--------|--------|-------|
//! | RSS / Atom feeds | [`rss`] | XML | No key needed |
//! | NewsAPI | [`newsapi`] | JSON | Requires API key |
//! | OpenWeather One Call | [`weather`] | JSON | Requires API key; optional |
//!
//! # Failure Handling
//!
//! [`fetch_entries`] never fails. A source that cannot be fetched or parsed
//! is logged and contributes zero entries, so one broken feed never stops
//! the run.

pub mod newsapi;
pub mod rss;
pub mod weather;

use crate::error::SourceError;
use crate::models::{Entry, SourceConfig, SourceKind};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Browser-like user agent; several feed hosts reject unknown clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) news_dashboard";

/// Build the HTTP client shared by every fetch in a run.
///
/// The timeout bounds each request end to end; expiry surfaces as a normal
/// per-source failure.
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// GET a URL and return the body, treating non-2xx responses as errors.
///
/// The URL is stripped from transport errors: it carries API keys.
pub(crate) async fn get_text(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String, SourceError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(reqwest::Error::without_url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    Ok(response.text().await.map_err(reqwest::Error::without_url)?)
}

/// Fetch one source and normalize its items, whatever its kind.
///
/// Never fails: errors are logged and yield an empty vector.
#[instrument(level = "info", skip_all, fields(source = %source.label, url = %source.url))]
pub async fn fetch_entries(
    client: &Client,
    source: &SourceConfig,
    news_api_key: Option<&str>,
) -> Vec<Entry> {
    let result = match source.kind {
        SourceKind::Rss => rss::fetch_feed(client, source).await,
        SourceKind::NewsApi => match news_api_key {
            Some(key) => newsapi::fetch_articles(client, source, key).await,
            None => Err(SourceError::Api("no NewsAPI key configured".to_string())),
        },
    };

    match result {
        Ok(entries) => {
            info!(count = entries.len(), "Parsed entries");
            entries
        }
        Err(e) => {
            warn!(error = %e, "Source failed; continuing without it");
            Vec::new()
        }
    }
}
