//! Utility functions for text cleanup, date normalization, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Markup stripping and summary truncation for feed text
//! - Best-effort parsing of the date formats feeds actually use
//! - HTML escaping and slugification for the renderer
//! - String truncation for logging
//! - File system validation for the output directory

use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::fs as stdfs;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use crate::models::Published;

/// Maximum number of characters kept in an entry summary.
pub const MAX_SUMMARY_CHARS: usize = 500;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Tags that end a block of text; a space is kept after them.
static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|tr|td|th|blockquote|pre|ul|ol|table|section|article)\s*>")
        .expect("valid regex")
});

/// Date layouts without a zone, read as UTC.
const NAIVE_DATE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Strip HTML markup from feed text and normalize whitespace.
///
/// The text is parsed as an HTML fragment, so tags are dropped and
/// entities (`&amp;`, `&#8217;`, ...) are decoded. Inline tags vanish
/// without a trace; block ends (`</p>`, `<br>`, ...) leave a space. Runs of
/// whitespace, including newlines, collapse to a single space.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("<p><b>Verstappen</b>, Norris.</p><p>Next</p>"), "Verstappen, Norris. Next");
/// ```
pub fn clean_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let spaced = BLOCK_BREAK.replace_all(raw, "$0 ");
    let fragment = Html::parse_fragment(&spaced);
    let text: String = fragment.root_element().text().collect();
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Resolve `link` against `base` and keep it only if it is `http(s)`.
///
/// Returns `None` for empty links, unparseable links and any other scheme
/// (`javascript:`, `data:`, `file:`, ...).
pub fn http_link(base: &str, link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(link).ok()?,
        Err(_) => return None,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// Truncate text to at most `max` characters, appending `...` when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_summary(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// Parse a feed timestamp, falling back to [`Published::Unknown`].
///
/// Accepts RFC 2822 (RSS `pubDate`), RFC 3339 (Atom, NewsAPI) and a few
/// zone-less layouts, which are taken as UTC.
pub fn parse_published(raw: &str) -> Published {
    let raw = raw.trim();
    if raw.is_empty() {
        return Published::Unknown;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Published::At(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Published::At(dt);
    }
    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Published::At(naive.and_utc().fixed_offset()))
        .unwrap_or(Published::Unknown)
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
    }
}

/// Convert a category name to a file-name-safe slug.
///
/// Lowercases the text, drops everything but alphanumerics, spaces and
/// hyphens, and joins words with single hyphens. Returns `"category"` when
/// nothing survives.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("US News"), "us-news");
/// assert_eq!(slugify("Autosport: F1!"), "autosport-f1");
/// ```
pub fn slugify(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .split(|c: char| c == ' ' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "category".to_string()
    } else {
        slug
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markup_and_entities() {
        assert_eq!(
            clean_text("<p>Hello &amp; <b>welcome</b></p>\n\n<p>to   the race</p>"),
            "Hello & welcome to the race"
        );
        assert_eq!(clean_text("It&#8217;s on"), "It\u{2019}s on");
        assert_eq!(clean_text("   "), "");
        assert_eq!(clean_text("plain text"), "plain text");
    }

    #[test]
    fn test_clean_text_inline_tags_leave_no_gaps() {
        assert_eq!(
            clean_text(r#"<p><b>Verstappen</b>, Norris and <a href="x">Leclerc</a>.</p>"#),
            "Verstappen, Norris and Leclerc."
        );
        assert_eq!(clean_text("F<sub>1</sub> is <i>back</i>!"), "F1 is back!");
        assert_eq!(clean_text("<p>First</p><p>Second</p>"), "First Second");
        assert_eq!(clean_text("line one<br/>line two<BR>three"), "line one line two three");
        assert_eq!(clean_text("<ul><li>a</li><li>b</li></ul>"), "a b");
    }

    #[test]
    fn test_http_link() {
        let base = "https://www.autosport.com/rss/feed/f1";
        assert_eq!(
            http_link(base, " https://www.autosport.com/f1/news/1 ").as_deref(),
            Some("https://www.autosport.com/f1/news/1")
        );
        assert_eq!(
            http_link(base, "/f1/news/2").as_deref(),
            Some("https://www.autosport.com/f1/news/2")
        );
        assert_eq!(http_link(base, "javascript:alert(document.cookie)"), None);
        assert_eq!(http_link(base, "JavaScript:alert(1)"), None);
        assert_eq!(http_link(base, "data:text/html,<script>x</script>"), None);
        assert_eq!(http_link(base, "file:///etc/passwd"), None);
        assert_eq!(http_link(base, ""), None);
        assert_eq!(http_link("not a base", "/relative"), None);
    }

    #[test]
    fn test_truncate_summary() {
        assert_eq!(truncate_summary("short", 10), "short");
        assert_eq!(truncate_summary("abcdefghij", 10), "abcdefghij");
        assert_eq!(truncate_summary("hello world again", 6), "hello...");

        let accented = "é".repeat(600);
        let cut = truncate_summary(&accented, MAX_SUMMARY_CHARS);
        assert_eq!(cut.chars().count(), MAX_SUMMARY_CHARS + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_parse_published_formats() {
        let rss = parse_published("Tue, 06 May 2025 14:30:00 +0000");
        assert_eq!(rss.to_string(), "2025-05-06 14:30");

        let gmt = parse_published("Tue, 06 May 2025 14:30:00 GMT");
        assert_eq!(gmt.to_string(), "2025-05-06 14:30");

        let iso = parse_published("2025-05-06T14:30:00Z");
        assert_eq!(iso.to_string(), "2025-05-06 14:30");

        let sql = parse_published("2025-05-06 14:30:00");
        assert_eq!(sql.to_string(), "2025-05-06 14:30");
    }

    #[test]
    fn test_parse_published_unknown() {
        assert_eq!(parse_published(""), Published::Unknown);
        assert_eq!(parse_published("sometime last week"), Published::Unknown);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("US News"), "us-news");
        assert_eq!(slugify("Autosport: F1!"), "autosport-f1");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("@#$"), "category");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
