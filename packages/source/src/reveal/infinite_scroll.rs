//! Fixed-count scrolling of an infinite-scroll review pane.

use std::sync::Arc;

use review_harvest_browser::{BrowserError, ElementRef, Locator, Page};

use super::{locate_records, open_reviews, random_delay};
use crate::progress::ProgressCallback;
use crate::source_def::InfiniteScrollConfig;

/// Scrolls the review pane `config.iterations` times and returns the record
/// nodes visible after the last pass.
///
/// Every pass is performed even when the record count stops growing. The
/// pane is scrolled when one of the container strategies matches, the window
/// otherwise.
///
/// # Errors
///
/// Returns [`BrowserError`] if the record lookup fails. Failed scroll
/// passes are logged and counted like successful ones.
pub async fn reveal_by_scrolling(
    page: &dyn Page,
    config: &InfiniteScrollConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<ElementRef>, BrowserError> {
    if let Some(opener) = &config.open_reviews {
        open_reviews(page, opener).await;
    }

    let container = find_container(page, &config.container).await;
    if container.is_some() {
        log::info!("Found scrollable reviews container");
    } else {
        log::info!("Could not find scrollable reviews container, scrolling the window");
    }

    progress.set_total(u64::from(config.iterations));
    let mut nodes = Vec::new();
    for pass in 1..=config.iterations {
        log::info!("Scrolling ({pass}/{})...", config.iterations);
        let scrolled = match &container {
            Some(pane) => pane.scroll_by(0, config.scroll_delta_px).await,
            None => page.scroll_window_by(config.scroll_delta_px).await,
        };
        if let Err(e) = scrolled {
            log::warn!("Scroll pass {pass} failed: {e}");
        }
        tokio::time::sleep(random_delay(config.min_delay_ms, config.max_delay_ms)).await;

        nodes = locate_records(page, &config.records).await?;
        log::info!("Current review count: {}", nodes.len());
        progress.set_message(format!("{} reviews loaded", nodes.len()));
        progress.inc(1);
    }

    if config.iterations == 0 {
        nodes = locate_records(page, &config.records).await?;
    }
    Ok(nodes)
}

async fn find_container(page: &dyn Page, strategies: &[Locator]) -> Option<ElementRef> {
    for locator in strategies {
        match page.find(locator).await {
            Ok(Some(pane)) => return Some(pane),
            Ok(None) => {}
            Err(e) => log::debug!("Container lookup by {locator} failed: {e}"),
        }
    }
    None
}
