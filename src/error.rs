//! Error types for the two failure tiers.
//!
//! [`SourceError`] is recoverable: the failing source is logged and skipped.
//! [`RunError`] aborts the run with a non-zero exit status.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single source produced no entries.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(u16),
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("document is not an RSS or Atom feed")]
    NotAFeed,
    #[error("api error: {0}")]
    Api(String),
}

/// Failures that abort the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("source {source_label:?} needs a NewsAPI key (set NEWS_API or --news-api-key)")]
    MissingApiKey { source_label: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("output directory {path} is not writable: {error}")]
    OutputDir { path: PathBuf, error: io::Error },
    #[error("every source failed and no weather is available; nothing to render")]
    NothingToRender,
    #[error("failed to write {path}: {error}")]
    Write { path: PathBuf, error: io::Error },
}
