//! Writes rendered pages into the output directory.
//!
//! Each page is written to a hidden temporary file next to its target and
//! then renamed over it, so a reader never sees a half-written page. The
//! writer never creates the output directory: a missing or read-only
//! directory is a fatal error for the run.

use crate::cli::OutputMode;
use crate::error::RunError;
use crate::models::Dashboard;
use crate::outputs::PageNames;
use crate::outputs::html::{render_category_page, render_dashboard, render_single_page};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Atomically replace `<dir>/<filename>` with `html`.
///
/// # Errors
///
/// Returns [`RunError::Write`] if the directory is missing or not writable.
#[instrument(level = "info", skip(html), fields(dir = %dir.display()))]
pub async fn write_page(dir: &Path, filename: &str, html: &str) -> Result<PathBuf, RunError> {
    let target = dir.join(filename);
    let tmp = dir.join(format!(".{filename}.tmp"));

    if let Err(e) = fs::write(&tmp, html).await {
        error!(path = %tmp.display(), error = %e, "Failed writing page");
        return Err(RunError::Write { path: tmp, error: e });
    }
    if let Err(e) = fs::rename(&tmp, &target).await {
        error!(path = %target.display(), error = %e, "Failed moving page into place");
        let _ = fs::remove_file(&tmp).await;
        return Err(RunError::Write {
            path: target,
            error: e,
        });
    }

    info!(path = %target.display(), bytes = html.len(), "Wrote page");
    Ok(target)
}

/// Render and write every page for `mode`, returning the written paths.
///
/// All pages are rendered before the first write.
///
/// # Errors
///
/// Returns [`RunError::NothingToRender`] without touching the directory
/// when the dashboard has no entries and no weather, and
/// [`RunError::Write`] when a page cannot be written.
#[instrument(level = "info", skip(dashboard), fields(dir = %dir.display()))]
pub async fn write_site(
    dashboard: &Dashboard,
    dir: &Path,
    filename: &str,
    mode: OutputMode,
) -> Result<Vec<PathBuf>, RunError> {
    if !dashboard.is_renderable() {
        error!("Every source failed and weather is unavailable; leaving existing pages untouched");
        return Err(RunError::NothingToRender);
    }

    let pages: Vec<(String, String)> = match mode {
        OutputMode::Single => vec![(filename.to_string(), render_single_page(dashboard))],
        OutputMode::Multi => {
            let names = PageNames::new(filename, &dashboard.groups);
            let mut pages = vec![(filename.to_string(), render_dashboard(dashboard, &names))];
            for group in &dashboard.groups {
                if let Some(page) = names.page_for(&group.name) {
                    pages.push((page.to_string(), render_category_page(dashboard, group, &names)));
                }
            }
            pages
        }
    };

    let mut written = Vec::with_capacity(pages.len());
    for (name, html) in &pages {
        written.push(write_page(dir, name, html).await?);
    }
    Ok(written)
}
