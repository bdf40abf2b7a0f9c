//! RSS 2.0 and Atom feed fetcher.
//!
//! Feeds are read with a streaming, namespace-aware `quick-xml` reader
//! rather than a full feed model: only the handful of fields an [`Entry`]
//! needs are collected. Elements from other vocabularies inside an item
//! (Media RSS, iTunes, ...) are skipped along with everything they contain.
//!
//! # Recognized Elements
//!
//! | Field | RSS 2.0 | Atom |
//! |-------|---------|------|
//! | title | `<title>` | `<title>` |
//! | link | `<link>` text | `<link href>` (prefers `rel="alternate"`) |
//! | summary | `<content:encoded>`, then `<description>` | `<content>`, then `<summary>` |
//! | published | `<pubDate>`, `<dc:date>` | `<published>`, then `<updated>` |

use crate::error::SourceError;
use crate::models::{Entry, SourceConfig, UNTITLED};
use crate::sources::get_text;
use crate::utils::{
    MAX_SUMMARY_CHARS, clean_text, http_link, parse_published, truncate_for_log, truncate_summary,
};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use reqwest::Client;
use std::borrow::Cow;
use tracing::{debug, instrument};

/// Namespaces whose elements may carry item fields, besides no namespace.
const FEED_NAMESPACES: &[&[u8]] = &[
    b"http://www.w3.org/2005/Atom",
    b"http://purl.org/rss/1.0/",
    b"http://purl.org/rss/1.0/modules/content/",
    b"http://purl.org/dc/elements/1.1/",
    b"http://purl.org/dc/terms/",
    b"http://backend.userland.com/rss2",
];

/// Prefixes accepted when a feed uses them without declaring them.
const FEED_PREFIXES: &[&[u8]] = &[b"atom", b"content", b"dc", b"dcterms"];

/// Which item field the reader is currently collecting text for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    Content,
    Published,
    Updated,
    ChannelLink,
}

/// Text of one `<item>`/`<entry>`, XML references decoded but markup intact.
#[derive(Debug, Default)]
struct ItemDraft {
    title: String,
    link: String,
    description: String,
    content: String,
    published: String,
    updated: String,
}

impl ItemDraft {
    fn slot(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Link => Some(&mut self.link),
            Field::Description => Some(&mut self.description),
            Field::Content => Some(&mut self.content),
            Field::Published => Some(&mut self.published),
            Field::Updated => Some(&mut self.updated),
            Field::ChannelLink => None,
        }
    }
}

/// Fetch an RSS or Atom feed and convert its items to entries.
#[instrument(level = "info", skip_all, fields(url = %source.url))]
pub async fn fetch_feed(client: &Client, source: &SourceConfig) -> Result<Vec<Entry>, SourceError> {
    let query: Vec<(&str, &str)> = source
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let body = get_text(client, &source.url, &query).await?;
    debug!(bytes = body.len(), preview = %truncate_for_log(&body, 120), "Fetched feed body");
    parse_feed(&body, source)
}

/// Parse an RSS 2.0, RSS 1.0 or Atom document into entries, in feed order.
///
/// Items with neither a title nor a link are dropped. A document without a
/// `<rss>`, `<rdf:RDF>` or `<feed>` root is rejected with
/// [`SourceError::NotAFeed`].
pub fn parse_feed(xml: &str, source: &SourceConfig) -> Result<Vec<Entry>, SourceError> {
    let mut reader = NsReader::from_str(xml);

    let mut saw_root = false;
    let mut channel_link = String::new();
    let mut draft: Option<ItemDraft> = None;
    let mut field: Option<Field> = None;
    let mut buf = String::new();
    // Depth of markup nested inside the field being collected (Atom xhtml content).
    let mut nested = 0usize;
    // Depth inside a foreign element of an item.
    let mut foreign = 0usize;
    let mut drafts = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        let known = is_feed_namespace(&ns);
        match event {
            Event::Start(e) => {
                if field.is_some() {
                    nested += 1;
                    continue;
                }
                if foreign > 0 || (draft.is_some() && !known) {
                    foreign += 1;
                    continue;
                }
                match e.local_name().as_ref() {
                    b"rss" | b"feed" | b"RDF" => saw_root = true,
                    b"item" | b"entry" if known => draft = Some(ItemDraft::default()),
                    b"link" if known => {
                        if let Some(href) = link_href(&e) {
                            store_href(&mut draft, &mut channel_link, href);
                        } else {
                            field = Some(if draft.is_some() { Field::Link } else { Field::ChannelLink });
                        }
                    }
                    name if draft.is_some() => field = item_field(name),
                    _ => {}
                }
                if field.is_some() {
                    buf.clear();
                }
            }
            Event::Empty(e) => {
                if field.is_none() && foreign == 0 && known && e.local_name().as_ref() == b"link" {
                    if let Some(href) = link_href(&e) {
                        store_href(&mut draft, &mut channel_link, href);
                    }
                }
            }
            Event::Text(t) => {
                if field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::CData(t) => {
                if field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::GeneralRef(r) => {
                if field.is_some() {
                    let reference = format!("&{};", String::from_utf8_lossy(&r));
                    buf.push_str(&unescape_lossy(&reference));
                }
            }
            Event::End(e) => {
                if nested > 0 {
                    nested -= 1;
                    continue;
                }
                if foreign > 0 {
                    foreign -= 1;
                    continue;
                }
                if let Some(current) = field.take() {
                    let text = std::mem::take(&mut buf);
                    if current == Field::ChannelLink {
                        if channel_link.is_empty() {
                            channel_link = text.trim().to_string();
                        }
                    } else if let Some(slot) = draft.as_mut().and_then(|d| d.slot(current)) {
                        if slot.trim().is_empty() {
                            *slot = text;
                        }
                    }
                    continue;
                }
                if matches!(e.local_name().as_ref(), b"item" | b"entry") {
                    if let Some(done) = draft.take() {
                        drafts.push(done);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(SourceError::NotAFeed);
    }

    let fallback_link = http_link(&source.url, &channel_link).unwrap_or_else(|| source.url.clone());
    let entries: Vec<Entry> = drafts
        .into_iter()
        .filter_map(|d| build_entry(d, source, &fallback_link))
        .collect();
    debug!(count = entries.len(), "Parsed feed items");
    Ok(entries)
}

fn is_feed_namespace(ns: &ResolveResult<'_>) -> bool {
    match ns {
        ResolveResult::Unbound => true,
        ResolveResult::Bound(Namespace(uri)) => FEED_NAMESPACES.iter().any(|known| known == uri),
        ResolveResult::Unknown(prefix) => FEED_PREFIXES.iter().any(|known| *known == prefix.as_slice()),
    }
}

fn item_field(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"description" | b"summary" => Some(Field::Description),
        b"encoded" | b"content" => Some(Field::Content),
        b"pubDate" | b"published" | b"date" | b"issued" => Some(Field::Published),
        b"updated" | b"modified" => Some(Field::Updated),
        _ => None,
    }
}

/// The `href` of an Atom-style link, unless it is a `self`/`enclosure` link.
fn link_href(e: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        match attr.key.local_name().as_ref() {
            b"href" => href = Some(unescape_lossy(&String::from_utf8_lossy(&attr.value))),
            b"rel" => rel = Some(String::from_utf8_lossy(&attr.value).into_owned()),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href,
        _ => None,
    }
}

fn store_href(draft: &mut Option<ItemDraft>, channel_link: &mut String, href: String) {
    match draft {
        Some(d) if d.link.is_empty() => d.link = href,
        Some(_) => {}
        None if channel_link.is_empty() => *channel_link = href,
        None => {}
    }
}

/// Decode XML character and entity references, keeping the input on failure.
///
/// Unknown entities (e.g. HTML's `&nbsp;`) survive for [`clean_text`] to decode.
fn unescape_lossy(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

fn build_entry(draft: ItemDraft, source: &SourceConfig, fallback_link: &str) -> Option<Entry> {
    let title = clean_text(&draft.title);
    let link = http_link(&source.url, &draft.link);
    if link.is_none() && !draft.link.trim().is_empty() {
        debug!(link = %truncate_for_log(draft.link.trim(), 80), "Ignoring non-http item link");
    }
    if title.is_empty() && link.is_none() {
        debug!("Dropping item without title or link");
        return None;
    }

    let link = link.unwrap_or_else(|| fallback_link.to_string());
    let title = if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    };

    let raw_summary = if draft.content.trim().is_empty() {
        &draft.description
    } else {
        &draft.content
    };
    let published = if draft.published.trim().is_empty() {
        parse_published(&draft.updated)
    } else {
        parse_published(&draft.published)
    };

    Some(Entry {
        title,
        link,
        summary: truncate_summary(&clean_text(raw_summary), MAX_SUMMARY_CHARS),
        published,
        source_name: source.label.clone(),
        category: source.category_name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Published;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Autosport F1</title>
    <link>https://www.autosport.com/f1/</link>
    <atom:link href="https://www.autosport.com/rss/feed/f1" rel="self" type="application/rss+xml"/>
    <item>
      <title><![CDATA[Verstappen takes <b>pole</b> in Miami]]></title>
      <link>https://www.autosport.com/f1/news/pole/1</link>
      <description><![CDATA[<p>Max Verstappen beat Norris &amp; Leclerc.</p>]]></description>
      <pubDate>Tue, 06 May 2025 14:30:00 +0000</pubDate>
    </item>
    <item>
      <title>Tom &amp; Jerry&#39;s team launch</title>
      <link>https://www.autosport.com/f1/news/launch/2?a=1&amp;b=2</link>
      <pubDate>next tuesday, probably</pubDate>
    </item>
    <item>
      <title>No link here</title>
      <description>Text only</description>
    </item>
    <item>
      <description>Neither title nor link</description>
    </item>
  </channel>
</rss>"#;

    fn source() -> SourceConfig {
        SourceConfig::rss("https://www.autosport.com/rss/feed/f1", "Autosport F1")
    }

    #[test]
    fn test_parse_rss_items_in_feed_order() {
        let entries = parse_feed(RSS, &source()).unwrap();
        assert_eq!(entries.len(), 3);

        let first = &entries[0];
        assert_eq!(first.title, "Verstappen takes pole in Miami");
        assert_eq!(first.link, "https://www.autosport.com/f1/news/pole/1");
        assert_eq!(first.summary, "Max Verstappen beat Norris & Leclerc.");
        assert_eq!(first.published.to_string(), "2025-05-06 14:30");
        assert_eq!(first.source_name, "Autosport F1");
        assert_eq!(first.category, "Autosport F1");

        assert_eq!(entries[1].title, "Tom & Jerry's team launch");
        assert_eq!(entries[1].link, "https://www.autosport.com/f1/news/launch/2?a=1&b=2");
    }

    #[test]
    fn test_missing_description_gives_empty_summary() {
        let entries = parse_feed(RSS, &source()).unwrap();
        assert_eq!(entries[1].summary, "");
    }

    #[test]
    fn test_unparseable_date_is_unknown() {
        let entries = parse_feed(RSS, &source()).unwrap();
        assert_eq!(entries[1].published, Published::Unknown);
    }

    #[test]
    fn test_missing_link_falls_back_to_channel_link() {
        let entries = parse_feed(RSS, &source()).unwrap();
        assert_eq!(entries[2].title, "No link here");
        assert_eq!(entries[2].link, "https://www.autosport.com/f1/");
        assert!(entries.iter().all(|e| !e.title.is_empty() && !e.link.is_empty()));
    }

    #[test]
    fn test_parse_atom_feed() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <link href="https://example.com/"/>
  <entry>
    <title type="html">Atom &lt;em&gt;entry&lt;/em&gt;</title>
    <link rel="replies" href="https://example.com/comments/1"/>
    <link rel="alternate" href="/posts/1"/>
    <updated>2025-05-06T09:00:00Z</updated>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Full <b>body</b></p></div></content>
    <summary>Short</summary>
  </entry>
</feed>"#;
        let source = SourceConfig::rss("https://example.com/atom.xml", "Example");
        let entries = parse_feed(atom, &source).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Atom entry");
        assert_eq!(entries[0].link, "https://example.com/posts/1");
        assert_eq!(entries[0].summary, "Full body");
        assert_eq!(entries[0].published.to_string(), "2025-05-06 09:00");
    }

    #[test]
    fn test_long_description_is_truncated() {
        let body = "word ".repeat(300);
        let xml = format!(
            "<rss><channel><item><title>T</title><link>https://x.test/1</link><description>{body}</description></item></channel></rss>"
        );
        let entries = parse_feed(&xml, &source()).unwrap();
        assert!(entries[0].summary.ends_with("..."));
        assert!(entries[0].summary.chars().count() <= MAX_SUMMARY_CHARS + 3);
    }

    #[test]
    fn test_media_rss_elements_are_ignored() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>EDM News</title>
    <link>https://edm.example/</link>
    <item>
      <title>Festival lineup announced</title>
      <media:title>Crowd at main stage</media:title>
      <link>https://edm.example/lineup</link>
      <description>The real summary</description>
      <dc:date>2025-05-06T08:00:00Z</dc:date>
      <media:content url="https://cdn.edm.example/photo.jpg" medium="image">
        <media:credit>Getty Images</media:credit>
        <media:description>Photo caption</media:description>
      </media:content>
      <media:thumbnail url="https://cdn.edm.example/thumb.jpg"/>
    </item>
  </channel>
</rss>"#;
        let source = SourceConfig::rss("https://edm.example/.rss/full/", "EDM News");
        let entries = parse_feed(xml, &source).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Festival lineup announced");
        assert_eq!(entries[0].summary, "The real summary");
        assert_eq!(entries[0].link, "https://edm.example/lineup");
        assert_eq!(entries[0].published.to_string(), "2025-05-06 08:00");
    }

    #[test]
    fn test_content_encoded_still_preferred() {
        let xml = r#"<rss xmlns:content="http://purl.org/rss/1.0/modules/content/"><channel>
<item><title>T</title><link>https://x.test/1</link><description>Short</description>
<content:encoded><![CDATA[<p>Long <b>body</b></p>]]></content:encoded></item>
</channel></rss>"#;
        let entries = parse_feed(xml, &source()).unwrap();
        assert_eq!(entries[0].summary, "Long body");
    }

    #[test]
    fn test_non_http_links_are_replaced() {
        let xml = r#"<rss><channel><link>https://www.autosport.com/f1/</link>
<item><title>Click me</title><link>javascript:alert(document.cookie)</link></item>
<item><title>Data</title><link>data:text/html;base64,PHNjcmlwdD4=</link></item>
<item><link>javascript:void(0)</link><description>No title either</description></item>
</channel></rss>"#;
        let entries = parse_feed(xml, &source()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.link == "https://www.autosport.com/f1/"));

        let channel_js = "<rss><channel><link>javascript:x()</link><item><title>T</title></item></channel></rss>";
        let entries = parse_feed(channel_js, &source()).unwrap();
        assert_eq!(entries[0].link, "https://www.autosport.com/rss/feed/f1");
    }

    #[test]
    fn test_html_page_is_not_a_feed() {
        let html = "<html><body><p>Service unavailable</p></body></html>";
        assert!(matches!(parse_feed(html, &source()), Err(SourceError::NotAFeed)));
    }

    #[test]
    fn test_empty_channel_is_ok() {
        let xml = "<rss><channel><title>Quiet</title></channel></rss>";
        assert!(parse_feed(xml, &source()).unwrap().is_empty());
    }
}
