//! HTML rendering for the dashboard and category pages.
//!
//! Every function here is pure: identical input gives byte-identical
//! output. Pages embed their stylesheet and reference no external assets,
//! so the output directory can be served as-is.

use crate::models::{CategoryGroup, Dashboard, Entry, ForecastDay, Weather, WeatherSummary};
use crate::outputs::{LAYOUT_IDS, PageNames, unique_slugs};
use crate::utils::{escape_html as esc, slugify};
use itertools::Itertools;

/// Number of headlines shown per category on the multi-page dashboard.
pub const TEASER_HEADLINES: usize = 3;

/// Text shown for a category that has no entries this run.
pub const NO_NEWS: &str = "No news available";

const CSS: &str = r#"
*{box-sizing:border-box;}
body{font-family:Arial,Helvetica,sans-serif;max-width:800px;margin:0 auto;padding:20px;background-color:#f5f5f5;color:#2c3e50;}
.page-header{text-align:center;margin-bottom:30px;}
.page-header h1{margin:0;color:#333;}
.back-link{margin-bottom:20px;}
.back-link a{color:#3498db;text-decoration:none;}
.back-link a:hover{text-decoration:underline;}
.section{margin-bottom:40px;}
.section-title{text-align:center;color:#333;padding:20px;background-color:#fff;border-radius:5px;margin-bottom:20px;box-shadow:0 2px 5px rgba(0,0,0,0.1);}
.entry,.teaser{background-color:#fff;padding:20px;margin-bottom:20px;border-radius:5px;box-shadow:0 2px 5px rgba(0,0,0,0.1);}
.entry-title,.teaser-title{color:#2c3e50;margin-top:0;}
.entry-title a,.teaser-title a{color:inherit;text-decoration:none;}
.entry-title a:hover,.teaser-title a:hover{text-decoration:underline;}
.entry-meta{color:#7f8c8d;font-size:0.9em;margin-bottom:10px;}
.entry-content{color:#34495e;line-height:1.6;}
.entry-link{display:inline-block;margin-top:10px;color:#3498db;text-decoration:none;}
.entry-link:hover{text-decoration:underline;}
.teaser ul{padding-left:20px;line-height:1.6;}
.teaser ul a{color:#34495e;}
.no-news{text-align:center;color:#95a5a6;font-style:italic;}
.weather-section{background-color:#fff;padding:20px;border-radius:5px;margin-bottom:40px;box-shadow:0 2px 5px rgba(0,0,0,0.1);}
.weather-section h1{margin-top:0;text-align:center;color:#333;}
.weather-forecast{display:flex;flex-wrap:wrap;gap:10px;}
.weather-day{flex:1 1 140px;background-color:#f9fbfc;border-radius:5px;padding:10px;}
.weather-day h3{margin:0 0 5px 0;}
.timestamp{text-align:center;color:#95a5a6;font-size:0.8em;margin-top:20px;}
"#;

/// Wrap page content in a complete HTML document.
fn build_page(title: &str, generated_at: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{CSS}</style>
</head>
<body>
{content}
<div class="timestamp">Generated on {generated_at}</div>
</body>
</html>
"#,
        title = esc(title),
        generated_at = esc(generated_at),
    )
}

fn render_header(title: &str) -> String {
    format!(
        r#"<header class="page-header"><h1>{}</h1></header>"#,
        esc(title)
    )
}

fn render_back_link(dashboard: &str) -> String {
    format!(
        r#"<nav class="back-link"><a href="{}">&larr; Back to dashboard</a></nav>"#,
        esc(dashboard)
    )
}

/// One entry card: linked title, metadata line, summary.
fn render_entry(entry: &Entry) -> String {
    let content = if entry.summary.is_empty() {
        String::new()
    } else {
        format!(
            r#"
<div class="entry-content">{}</div>"#,
            esc(&entry.summary)
        )
    };
    format!(
        r#"<article class="entry">
<h2 class="entry-title"><a href="{link}" target="_blank" rel="noopener">{title}</a></h2>
<div class="entry-meta">{published} | Source: {source}</div>{content}
<a class="entry-link" href="{link}" target="_blank" rel="noopener">Read more &rarr;</a>
</article>
"#,
        link = esc(&entry.link),
        title = esc(&entry.title),
        published = esc(&entry.published.to_string()),
        source = esc(&entry.source_name),
    )
}

/// A full category section, or the placeholder when it is empty.
fn render_section(group: &CategoryGroup, id: &str) -> String {
    let body = if group.entries.is_empty() {
        format!(r#"<p class="no-news">{NO_NEWS}</p>"#)
    } else {
        group.entries.iter().map(render_entry).join("")
    };
    format!(
        r#"<section class="section" id="{id}">
<h1 class="section-title">{name}</h1>
{body}
</section>
"#,
        id = esc(id),
        name = esc(&group.name),
    )
}

fn render_forecast_day(day: &ForecastDay, summary: &WeatherSummary) -> String {
    let temp = summary.units.temp_symbol();
    let mut precip = Vec::new();
    if day.pop > 0.0 {
        precip.push(format!("Chance of precipitation: {:.0}%", day.pop * 100.0));
    }
    if day.rain > 0.0 {
        precip.push(format!("Rain: {}mm", day.rain));
    }
    if day.snow > 0.0 {
        precip.push(format!("Snow: {}mm", day.snow));
    }
    let precip = if precip.is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>", precip.join(", "))
    };
    format!(
        r#"<div class="weather-day">
<h3>{day_name}</h3>
<p>{main}: {description}</p>
<p>High: {max:.0}{temp}, Low: {min:.0}{temp}</p>{precip}
</div>
"#,
        day_name = esc(&day.day_name),
        main = esc(&day.main),
        description = esc(&day.description),
        max = day.temp_max,
        min = day.temp_min,
    )
}

/// The weather block, or a short notice when weather is unavailable.
fn render_weather(weather: &Weather) -> String {
    let summary = match weather {
        Weather::Available(summary) => summary,
        Weather::Unavailable { .. } => {
            return r#"<section class="weather-section" id="weather">
<h1>Weather</h1>
<p class="no-news">Weather data is currently unavailable.</p>
</section>
"#
            .to_string();
        }
    };

    let c = &summary.current;
    let temp = summary.units.temp_symbol();
    let speed = summary.units.speed_symbol();
    let forecast = summary
        .forecast
        .iter()
        .map(|day| render_forecast_day(day, summary))
        .join("");

    format!(
        r#"<section class="weather-section" id="weather">
<h1>Weather &middot; {location}</h1>
<div class="weather-current">
<p><strong>Current Conditions:</strong> {main} - {description}</p>
<p>Temperature: {temp_now:.0}{temp} (Feels like: {feels:.0}{temp})</p>
<p>Wind: {wind:.1} {speed}</p>
<p>Humidity: {humidity}%</p>
<p>Sunrise: {sunrise}, Sunset: {sunset}</p>
<p class="entry-meta">Observed {observed}</p>
</div>
<div class="weather-forecast">
{forecast}</div>
</section>
"#,
        location = esc(&summary.location),
        main = esc(&c.main),
        description = esc(&c.description),
        temp_now = c.temp,
        feels = c.feels_like,
        wind = c.wind_speed,
        humidity = c.humidity,
        sunrise = esc(&c.sunrise),
        sunset = esc(&c.sunset),
        observed = esc(&c.observed_at),
    )
}

/// Teaser card for one category on the multi-page dashboard.
fn render_teaser(group: &CategoryGroup, page: &str, id: &str) -> String {
    let count = group.entries.len();
    let body = if count == 0 {
        format!(r#"<p class="no-news">{NO_NEWS}</p>"#)
    } else {
        let headlines = group
            .entries
            .iter()
            .take(TEASER_HEADLINES)
            .map(|e| {
                format!(
                    r#"<li><a href="{}" target="_blank" rel="noopener">{}</a></li>"#,
                    esc(&e.link),
                    esc(&e.title)
                )
            })
            .join("\n");
        let noun = if count == 1 { "story" } else { "stories" };
        format!(
            r#"<ul>
{headlines}
</ul>
<a class="entry-link" href="{page}">View all {count} {noun} &rarr;</a>"#,
            page = esc(page),
        )
    };
    format!(
        r#"<div class="teaser" id="{id}">
<h2 class="teaser-title"><a href="{page}">{name}</a></h2>
{body}
</div>
"#,
        id = esc(id),
        page = esc(page),
        name = esc(&group.name),
    )
}

/// Render everything on one page: weather, then every category in order.
pub fn render_single_page(dashboard: &Dashboard) -> String {
    let ids = unique_slugs(dashboard.groups.iter().map(|g| g.name.as_str()), LAYOUT_IDS);
    let sections = dashboard
        .groups
        .iter()
        .zip(&ids)
        .map(|(group, id)| render_section(group, id))
        .join("");
    let content = format!(
        "{}\n{}{}",
        render_header(&dashboard.title),
        render_weather(&dashboard.weather),
        sections
    );
    build_page(&dashboard.title, &dashboard.generated_at, &content)
}

/// Render the multi-page dashboard: weather plus a teaser per category.
pub fn render_dashboard(dashboard: &Dashboard, names: &PageNames) -> String {
    let teasers = dashboard
        .groups
        .iter()
        .filter_map(|group| {
            let page = names.page_for(&group.name)?;
            let id = names.anchor_for(&group.name)?;
            Some(render_teaser(group, page, id))
        })
        .join("");
    let content = format!(
        "{}\n{}<section class=\"section\" id=\"categories\">\n{}</section>\n",
        render_header(&dashboard.title),
        render_weather(&dashboard.weather),
        teasers
    );
    build_page(&dashboard.title, &dashboard.generated_at, &content)
}

/// Render one category's page with a link back to the dashboard.
pub fn render_category_page(dashboard: &Dashboard, group: &CategoryGroup, names: &PageNames) -> String {
    let back = render_back_link(&names.dashboard);
    let id = names
        .anchor_for(&group.name)
        .map(str::to_string)
        .unwrap_or_else(|| slugify(&group.name));
    let content = format!(
        "{back}\n{}\n{}{back}\n",
        render_header(&group.name),
        render_section(group, &id),
    );
    let title = format!("{} | {}", group.name, dashboard.title);
    build_page(&title, &dashboard.generated_at, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrentConditions, Published, Units};
    use chrono::DateTime;

    fn entry(title: &str, category: &str, summary: &str) -> Entry {
        Entry {
            title: title.to_string(),
            link: format!("https://example.com/{}", slugify(title)),
            summary: summary.to_string(),
            published: Published::At(DateTime::parse_from_rfc3339("2025-05-06T10:15:00Z").unwrap()),
            source_name: category.to_string(),
            category: category.to_string(),
        }
    }

    fn summary() -> WeatherSummary {
        WeatherSummary {
            location: "Riverton, UT".to_string(),
            units: Units::Imperial,
            current: CurrentConditions {
                observed_at: "2025-05-06 08:00".to_string(),
                temp: 64.4,
                feels_like: 62.1,
                humidity: 31,
                wind_speed: 8.2,
                main: "Clouds".to_string(),
                description: "broken clouds".to_string(),
                sunrise: "06:20".to_string(),
                sunset: "20:20".to_string(),
            },
            forecast: vec![ForecastDay {
                date: "2025-05-07".to_string(),
                day_name: "Wednesday".to_string(),
                main: "Rain".to_string(),
                description: "light rain".to_string(),
                temp_min: 45.0,
                temp_max: 66.0,
                pop: 0.62,
                rain: 2.3,
                snow: 0.0,
            }],
        }
    }

    fn dashboard(weather: Weather) -> Dashboard {
        Dashboard {
            title: "Daily News Dashboard".to_string(),
            generated_at: "2025-05-06 12:00:00".to_string(),
            groups: vec![
                CategoryGroup {
                    name: "US News".to_string(),
                    entries: vec![
                        entry("Senate <passes> budget", "US News", "Vote & more"),
                        entry("Storm warning", "US News", ""),
                    ],
                },
                CategoryGroup {
                    name: "Autosport F1".to_string(),
                    entries: vec![
                        entry("Pole in Miami", "Autosport F1", "Quick lap"),
                        entry("Race report", "Autosport F1", ""),
                        entry("Upgrades", "Autosport F1", ""),
                        entry("Driver market", "Autosport F1", ""),
                    ],
                },
                CategoryGroup {
                    name: "EDM News".to_string(),
                    entries: vec![],
                },
            ],
            weather,
        }
    }

    #[test]
    fn test_single_page_sections_in_order() {
        let html = render_single_page(&dashboard(Weather::Available(summary())));
        let us = html.find(">US News</h1>").unwrap();
        let f1 = html.find(">Autosport F1</h1>").unwrap();
        let edm = html.find(">EDM News</h1>").unwrap();
        assert!(html.find("id=\"weather\"").unwrap() < us);
        assert!(us < f1 && f1 < edm);
        assert!(html.contains(NO_NEWS));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("<link rel=\"stylesheet\""));
    }

    #[test]
    fn test_entry_card_contents_are_escaped() {
        let html = render_single_page(&dashboard(Weather::unavailable("boom")));
        assert!(html.contains("Senate &lt;passes&gt; budget"));
        assert!(html.contains("Vote &amp; more"));
        assert!(html.contains("2025-05-06 10:15 | Source: US News"));
        assert!(html.contains(r#"href="https://example.com/storm-warning" target="_blank" rel="noopener""#));
        assert!(!html.contains("Senate <passes>"));
    }

    #[test]
    fn test_unknown_date_is_rendered() {
        let mut d = dashboard(Weather::unavailable("boom"));
        d.groups[0].entries[1].published = Published::Unknown;
        let html = render_single_page(&d);
        assert!(html.contains("unknown | Source: US News"));
    }

    #[test]
    fn test_weather_block() {
        let html = render_single_page(&dashboard(Weather::Available(summary())));
        assert!(html.contains("Weather &middot; Riverton, UT"));
        assert!(html.contains("Clouds - broken clouds"));
        assert!(html.contains("Temperature: 64°F (Feels like: 62°F)"));
        assert!(html.contains("Wind: 8.2 mph"));
        assert!(html.contains("High: 66°F, Low: 45°F"));
        assert!(html.contains("Chance of precipitation: 62%, Rain: 2.3mm"));
    }

    #[test]
    fn test_unavailable_weather_keeps_all_categories() {
        let html = render_single_page(&dashboard(Weather::unavailable("timeout")));
        assert!(html.contains("Weather data is currently unavailable."));
        assert!(!html.contains("timeout"));
        for name in ["US News", "Autosport F1", "EDM News"] {
            assert!(html.contains(&format!(">{name}</h1>")));
        }
    }

    #[test]
    fn test_dashboard_links_every_category() {
        let d = dashboard(Weather::unavailable("x"));
        let names = PageNames::new("index.html", &d.groups);
        let html = render_dashboard(&d, &names);

        for (_, page) in &names.categories {
            assert!(html.contains(&format!(r#"href="{page}""#)));
        }
        assert!(html.contains("View all 4 stories"));
        assert!(html.contains("View all 2 stories"));
        assert!(html.contains("Upgrades"));
        assert!(!html.contains("Driver market"));
        assert!(html.contains(NO_NEWS));
    }

    #[test]
    fn test_category_page_links_back() {
        let d = dashboard(Weather::unavailable("x"));
        let names = PageNames::new("News_2025-05-06.html", &d.groups);
        for group in &d.groups {
            let html = render_category_page(&d, group, &names);
            assert!(html.contains(r#"<a href="News_2025-05-06.html">&larr; Back to dashboard</a>"#));
            assert!(html.contains(&format!("<title>{} | Daily News Dashboard</title>", group.name)));
        }
        let f1 = render_category_page(&d, &d.groups[1], &names);
        assert!(f1.contains("Driver market"));
        assert!(!f1.contains("Storm warning"));
    }

    #[test]
    fn test_colliding_category_ids_stay_unique() {
        let mut d = dashboard(Weather::unavailable("x"));
        d.groups[0].name = "US News".to_string();
        d.groups[1].name = "US-News".to_string();
        d.groups[2].name = "Weather".to_string();

        let single = render_single_page(&d);
        assert_eq!(single.matches(r#"id="us-news""#).count(), 1);
        assert_eq!(single.matches(r#"id="us-news-2""#).count(), 1);
        assert_eq!(single.matches(r#"id="weather""#).count(), 1);
        assert!(single.contains(r#"id="weather-2""#));

        let names = PageNames::new("index.html", &d.groups);
        let dash = render_dashboard(&d, &names);
        assert!(dash.contains(r#"<div class="teaser" id="us-news-2">"#));
        assert_eq!(dash.matches(r#"id="weather""#).count(), 1);
        let page = render_category_page(&d, &d.groups[1], &names);
        assert!(page.contains(r#"<section class="section" id="us-news-2">"#));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let d = dashboard(Weather::Available(summary()));
        assert_eq!(render_single_page(&d), render_single_page(&d.clone()));
        let names = PageNames::new("index.html", &d.groups);
        assert_eq!(render_dashboard(&d, &names), render_dashboard(&d, &names));
    }
}
