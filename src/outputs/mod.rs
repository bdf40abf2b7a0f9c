//! HTML output: pure rendering plus atomic file writes.
//!
//! # Submodules
//!
//! - [`html`]: Renders a [`Dashboard`](crate::models::Dashboard) to self-contained HTML documents
//! - [`writer`]: Writes rendered pages into the output directory
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── index.html          # Single mode: everything. Multi mode: weather + teasers
//! ├── us-news.html        # Multi mode only, one page per category
//! └── autosport-f1.html
//! ```

pub mod html;
pub mod writer;

use crate::models::CategoryGroup;
use crate::utils::slugify;

/// Element ids used by the page layout itself.
pub const LAYOUT_IDS: &[&str] = &["weather", "categories"];

/// Slug every name, suffixing `-2`, `-3`, ... so that no slug repeats or
/// matches one of `reserved`.
pub fn unique_slugs<'a>(names: impl IntoIterator<Item = &'a str>, reserved: &[&str]) -> Vec<String> {
    let mut taken: Vec<String> = reserved.iter().map(|r| r.to_string()).collect();
    let mut slugs = Vec::new();
    for name in names {
        let slug = slugify(name);
        let mut candidate = slug.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{slug}-{n}");
            n += 1;
        }
        taken.push(candidate.clone());
        slugs.push(candidate);
    }
    slugs
}

/// File names of every page in a multi-page site.
#[derive(Debug, Clone, PartialEq)]
pub struct PageNames {
    /// Dashboard file name, used by the back links.
    pub dashboard: String,
    /// `(category, file name)` in display order.
    pub categories: Vec<(String, String)>,
}

impl PageNames {
    /// Derive page names from the category slugs.
    ///
    /// Names are deterministic. A slug that collides with the dashboard, a
    /// layout id or an earlier category gets a numeric suffix, so the file
    /// stem doubles as a unique element id.
    pub fn new(dashboard: &str, groups: &[CategoryGroup]) -> Self {
        let mut reserved: Vec<&str> = Vec::with_capacity(LAYOUT_IDS.len() + 1);
        reserved.extend_from_slice(LAYOUT_IDS);
        if let Some(stem) = dashboard.strip_suffix(".html") {
            reserved.push(stem);
        }
        let stems = unique_slugs(groups.iter().map(|g| g.name.as_str()), &reserved);
        let categories = groups
            .iter()
            .zip(stems)
            .map(|(group, stem)| (group.name.clone(), format!("{stem}.html")))
            .collect();

        Self {
            dashboard: dashboard.to_string(),
            categories,
        }
    }

    /// File name of a category's page.
    pub fn page_for(&self, category: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, file)| file.as_str())
    }

    /// Element id of a category's section or teaser.
    pub fn anchor_for(&self, category: &str) -> Option<&str> {
        self.page_for(category)
            .map(|file| file.strip_suffix(".html").unwrap_or(file))
    }
}
