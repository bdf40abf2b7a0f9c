//! Drives every configured source and groups the results for rendering.
//!
//! Sources are fetched in configured order. With `concurrency > 1` several
//! requests are in flight at once, but results are still collected in
//! configured order, so the output is the same either way.

use crate::config::Config;
use crate::models::{CategoryGroup, Dashboard, Entry, SourceConfig};
use crate::sources::fetch_entries;
use crate::sources::weather::fetch_weather;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use tracing::{info, instrument};

/// Fetch every source and the weather, and assemble the [`Dashboard`].
///
/// Per-source failures have already been logged by the fetchers; they show
/// up here as empty categories.
#[instrument(level = "info", skip_all, fields(sources = config.sources.len()))]
pub async fn aggregate(client: &Client, config: &Config, generated_at: String) -> Dashboard {
    let news_api_key = config.news_api_key.as_deref();

    let fetched: Vec<Vec<Entry>> = stream::iter(config.sources.iter())
        .map(|source| fetch_entries(client, source, news_api_key))
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    for (source, entries) in config.sources.iter().zip(&fetched) {
        info!(source = %source.label, count = entries.len(), "Source finished");
    }

    let weather = fetch_weather(client, &config.weather).await;
    let groups = group_entries(&config.sources, fetched, &config.category_order);

    let dashboard = Dashboard {
        title: config.title.clone(),
        generated_at,
        groups,
        weather,
    };
    info!(
        categories = dashboard.groups.len(),
        entries = dashboard.entry_count(),
        weather = dashboard.weather.is_available(),
        "Aggregation complete"
    );
    dashboard
}

/// Group per-source results into categories in display order.
///
/// `fetched[i]` holds the entries of `sources[i]`. Categories named in
/// `category_order` come first, in that order; the rest follow in order of
/// first appearance in `sources`. Every configured category is present, even
/// with no entries. Order names that match no source are ignored.
pub fn group_entries(
    sources: &[SourceConfig],
    fetched: Vec<Vec<Entry>>,
    category_order: &[String],
) -> Vec<CategoryGroup> {
    let configured: Vec<&str> = sources.iter().map(|s| s.category_name()).unique().collect();

    let ordered = category_order
        .iter()
        .map(String::as_str)
        .filter(|name| configured.contains(name))
        .chain(configured.iter().copied())
        .unique();

    let mut groups: Vec<CategoryGroup> = ordered
        .map(|name| CategoryGroup {
            name: name.to_string(),
            entries: Vec::new(),
        })
        .collect();

    for (source, entries) in sources.iter().zip(fetched) {
        if let Some(group) = groups.iter_mut().find(|g| g.name == source.category_name()) {
            group.entries.extend(entries);
        }
    }
    groups
}
