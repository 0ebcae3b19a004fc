//! Making records reachable before extraction.
//!
//! Review sites only render a handful of records up front. Infinite-scroll
//! panes need a fixed number of scroll passes ([`infinite_scroll`]); paged
//! lists need per-page expansion and a next-page click ([`paginated`]).

pub mod infinite_scroll;
pub mod paginated;

use std::time::Duration;

use rand::Rng;
use review_harvest_browser::{BrowserError, ElementRef, Locator, Page};

use crate::source_def::OpenReviewsConfig;

pub use infinite_scroll::reveal_by_scrolling;
pub use paginated::{PageBatch, Paginator};

pub(crate) async fn pause_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Picks a uniformly random delay in `min_ms..=max_ms`.
pub(crate) fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

/// Clicks the first "all reviews" button that appears.
///
/// Candidates are waited for in order. Returns whether a button was clicked;
/// failing to find one is not an error since some pages already show the
/// full list.
pub async fn open_reviews(page: &dyn Page, config: &OpenReviewsConfig) -> bool {
    for locator in &config.candidates {
        match click_open_button(page, locator, config).await {
            Ok(true) => {
                log::info!("Clicked reviews button found by {locator}");
                return true;
            }
            Ok(false) => log::debug!("No reviews button matched {locator}"),
            Err(e) => log::debug!("Reviews button {locator} failed: {e}"),
        }
    }
    log::info!("Could not locate or click the reviews button");
    false
}

async fn click_open_button(
    page: &dyn Page,
    locator: &Locator,
    config: &OpenReviewsConfig,
) -> Result<bool, BrowserError> {
    let Some(button) = page
        .wait_for(locator, Duration::from_millis(config.wait_ms))
        .await?
    else {
        return Ok(false);
    };
    button.scroll_into_view().await?;
    pause_ms(config.before_click_ms).await;
    button.click_or_force().await?;
    pause_ms(config.after_click_ms).await;
    Ok(true)
}

/// Returns the matches of the first strategy that matches anything.
///
/// # Errors
///
/// Returns [`BrowserError`] if a lookup fails.
pub async fn locate_records(
    page: &dyn Page,
    strategies: &[Locator],
) -> Result<Vec<ElementRef>, BrowserError> {
    for locator in strategies {
        let nodes = page.find_all(locator).await?;
        if !nodes.is_empty() {
            log::debug!("Found {} records by {locator}", nodes.len());
            return Ok(nodes);
        }
    }
    Ok(Vec::new())
}
