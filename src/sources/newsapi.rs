//! NewsAPI (`https://newsapi.org`) article fetcher.
//!
//! The key travels as the `apiKey` query parameter. Any extra parameters
//! from the source configuration (`country`, `category`, `q`, ...) are sent
//! along with it.

use crate::error::SourceError;
use crate::models::{Entry, SourceConfig, UNTITLED};
use crate::sources::get_text;
use crate::utils::{
    MAX_SUMMARY_CHARS, clean_text, http_link, parse_published, truncate_for_log, truncate_summary,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Title NewsAPI puts on articles that were withdrawn by the publisher.
const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    #[serde(default)]
    source: Option<ApiSource>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    #[serde(default)]
    name: Option<String>,
}

/// Fetch headlines from a NewsAPI endpoint.
#[instrument(level = "info", skip_all, fields(url = %source.url))]
pub async fn fetch_articles(
    client: &Client,
    source: &SourceConfig,
    api_key: &str,
) -> Result<Vec<Entry>, SourceError> {
    let mut query: Vec<(&str, &str)> = vec![("apiKey", api_key)];
    query.extend(source.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let body = get_text(client, &source.url, &query).await?;
    parse_articles(&body, source)
}

/// Parse a NewsAPI JSON response into entries, in response order.
///
/// A response whose `status` is not `"ok"` is an error carrying the API's
/// message.
pub fn parse_articles(body: &str, source: &SourceConfig) -> Result<Vec<Entry>, SourceError> {
    let response: ApiResponse = serde_json::from_str(body).inspect_err(|e| {
        warn!(error = %e, body = %truncate_for_log(body, 300), "NewsAPI returned unexpected JSON");
    })?;

    if response.status != "ok" {
        return Err(SourceError::Api(
            response
                .message
                .unwrap_or_else(|| format!("status {}", response.status)),
        ));
    }

    let entries: Vec<Entry> = response
        .articles
        .into_iter()
        .filter_map(|article| build_entry(article, source))
        .collect();
    debug!(count = entries.len(), "Parsed NewsAPI articles");
    Ok(entries)
}

fn build_entry(article: ApiArticle, source: &SourceConfig) -> Option<Entry> {
    let title = clean_text(article.title.as_deref().unwrap_or_default());
    let link = article.url.as_deref().and_then(|url| http_link(&source.url, url));

    if title == REMOVED_MARKER {
        debug!("Skipping withdrawn article");
        return None;
    }
    if title.is_empty() && link.is_none() {
        return None;
    }

    let title = if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    };
    let link = link.unwrap_or_else(|| source.url.clone());

    let raw_summary = article
        .description
        .filter(|d| !d.trim().is_empty())
        .or(article.content)
        .unwrap_or_default();

    let outlet = article
        .source
        .and_then(|s| s.name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Some(Entry {
        title,
        link,
        summary: truncate_summary(&clean_text(&raw_summary), MAX_SUMMARY_CHARS),
        published: parse_published(article.published_at.as_deref().unwrap_or_default()),
        source_name: format!("{} - {}", source.label, outlet),
        category: source.category_name().to_string(),
    })
}
