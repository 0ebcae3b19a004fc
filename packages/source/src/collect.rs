//! Running one source definition against a live page.

use std::sync::Arc;

use review_harvest_browser::Page;
use review_harvest_review_models::StandardizedReview;

use crate::SourceError;
use crate::assemble::assemble_reviews;
use crate::progress::ProgressCallback;
use crate::reveal::{Paginator, pause_ms, reveal_by_scrolling};
use crate::source_def::{RevealConfig, SourceDefinition};

/// Per-run knobs that are not part of a source definition.
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Upper bound on result pages visited by paginated sources.
    pub max_pages: u32,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self { max_pages: 5 }
    }
}

/// Navigates to `url`, reveals the records and assembles them.
///
/// Records of a paginated source are assembled page by page, before the
/// next page replaces them.
///
/// The progress indicator is finished on success and cleared on failure.
///
/// # Errors
///
/// Returns [`SourceError`] if navigation or the reveal loop fails. Records
/// that fail individually are skipped, not reported.
pub async fn collect_reviews(
    page: &dyn Page,
    url: &str,
    definition: &SourceDefinition,
    options: &CollectOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<StandardizedReview>, SourceError> {
    match reveal_and_assemble(page, url, definition, options, progress).await {
        Ok(reviews) => {
            log::info!(
                "Successfully scraped {} reviews from {}",
                reviews.len(),
                definition.name()
            );
            progress.finish(format!("{}: {} reviews", definition.name(), reviews.len()));
            Ok(reviews)
        }
        Err(e) => {
            progress.finish_and_clear();
            Err(e)
        }
    }
}

async fn reveal_and_assemble(
    page: &dyn Page,
    url: &str,
    definition: &SourceDefinition,
    options: &CollectOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<StandardizedReview>, SourceError> {
    log::info!("Opening {} URL...", definition.name());
    page.goto(url).await?;
    log::info!("Opened URL: {url}");
    pause_ms(definition.load_settle_ms).await;

    let reviews = match &definition.reveal {
        RevealConfig::InfiniteScroll(config) => {
            let nodes = reveal_by_scrolling(page, config, progress).await?;
            assemble_reviews(&nodes, definition, None).await
        }
        RevealConfig::Paginated(config) => {
            progress.set_total(u64::from(options.max_pages));
            let mut paginator = Paginator::new(page, config, options.max_pages);
            let mut reviews = Vec::new();
            while let Some(batch) = paginator.next_batch().await? {
                let assembled =
                    assemble_reviews(&batch.nodes, definition, Some(batch.page_number)).await;
                reviews.extend(assembled);
                progress.set_message(format!("{} reviews", reviews.len()));
                progress.inc(1);
            }
            log::info!(
                "Scraped {} reviews from {} pages",
                reviews.len(),
                paginator.pages_visited()
            );
            reviews
        }
    };
    Ok(reviews)
}
