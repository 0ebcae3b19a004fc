#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Review harvesting pipeline.
//!
//! [`run`] owns one browser session for the whole run, reads Google Maps
//! and then Booking.com (whichever URLs are configured), closes the session
//! and hands the accumulated reviews to the file writer and the webhook.
//! A failing source never stops the other one; only a session that cannot
//! be started or an output file that cannot be written fails the run.

pub mod config;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use review_harvest_browser::{BrowserError, Launcher};
use review_harvest_delivery::{DeliveryError, WebhookNotifier, WebhookOutcome, write_reviews_json};
use review_harvest_review_models::{ReviewSource, StandardizedReview};
use review_harvest_source::progress::ProgressCallback;
use review_harvest_source::{CollectOptions, collect_reviews, registry};

pub use config::RunConfig;

/// Errors that end a harvest run.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// The run configuration is unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what went wrong.
        message: String,
    },

    /// The browser session could not be started.
    #[error("Error initializing browser session: {0}")]
    Session(#[source] BrowserError),

    /// The output file could not be written.
    #[error("Error writing output: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Hands out a progress reporter for each source as it starts.
pub type ProgressFactory = dyn Fn(ReviewSource) -> Arc<dyn ProgressCallback> + Send + Sync;

/// Checkpoints of a run, recorded in the order they are reached.
///
/// A normal run goes `SessionStarted`, one `Harvested` per configured
/// source, `Accumulated`, `Persisted`, `Notified` (only with a webhook URL)
/// and `Done`. An empty collection goes straight from `Accumulated` to
/// `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// The browser session is up.
    SessionStarted,
    /// The source's stage finished, successfully or not.
    Harvested(ReviewSource),
    /// Every source has run and the session is closed.
    Accumulated,
    /// The output file was written.
    Persisted,
    /// The webhook was attempted. Reached even when delivery failed.
    Notified,
    Done,
}

fn enter(stages: &mut Vec<RunStage>, stage: RunStage) {
    log::debug!("Run stage: {stage:?}");
    stages.push(stage);
}

/// How one source fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Which source this report covers.
    pub source: ReviewSource,
    /// Reviews collected from this source.
    pub reviews: usize,
    /// Why the source stopped early, if it did.
    pub error: Option<String>,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Every collected review, Google Maps records first.
    pub reviews: Vec<StandardizedReview>,
    /// One entry per configured source, in run order.
    pub sources: Vec<SourceReport>,
    /// Where the reviews were written. `None` when nothing was collected.
    pub output_path: Option<PathBuf>,
    /// Webhook result. `None` when nothing was collected, so delivery was
    /// never attempted.
    pub webhook: Option<WebhookOutcome>,
    /// Stages the run went through.
    pub stages: Vec<RunStage>,
}

/// Runs a full harvest.
///
/// # Errors
///
/// * [`HarvestError::InvalidConfig`] before anything is started.
/// * [`HarvestError::Session`] if the browser cannot be launched. Nothing is
///   written in that case.
/// * [`HarvestError::Delivery`] if the output file cannot be written. The
///   session is already closed by then and the webhook is not called.
///
/// Source failures and webhook failures are logged and reported in the
/// [`RunSummary`] instead.
pub async fn run(
    config: &RunConfig,
    launcher: &dyn Launcher,
    progress: &ProgressFactory,
) -> Result<RunSummary, HarvestError> {
    config.validate()?;

    let session = launcher.launch().await.map_err(|e| {
        log::error!("Error initializing browser session: {e}");
        HarvestError::Session(e)
    })?;
    let mut stages = Vec::new();
    enter(&mut stages, RunStage::SessionStarted);

    let options = CollectOptions {
        max_pages: config.booking_max_pages,
    };
    let mut reviews = Vec::new();
    let mut sources = Vec::new();

    for (source, url) in config.targets() {
        let Some(definition) = registry::find_source(source) else {
            log::warn!("No source definition configured for {source}, skipping");
            continue;
        };

        log::info!("Scraping {source} reviews...");
        let report = match collect_reviews(
            session.page(),
            url,
            &definition,
            &options,
            &progress(source),
        )
        .await
        {
            Ok(found) => {
                log::info!("Scraped {} {source} reviews", found.len());
                let count = found.len();
                reviews.extend(found);
                SourceReport {
                    source,
                    reviews: count,
                    error: None,
                }
            }
            Err(e) => {
                log::error!("Error scraping {source}: {e}");
                SourceReport {
                    source,
                    reviews: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        sources.push(report);
        enter(&mut stages, RunStage::Harvested(source));
    }

    if let Err(e) = session.close().await {
        log::warn!("Error closing browser session: {e}");
    }

    enter(&mut stages, RunStage::Accumulated);

    if reviews.is_empty() {
        log::warn!("No reviews were scraped. Please check the provided URLs.");
        enter(&mut stages, RunStage::Done);
        return Ok(RunSummary {
            reviews,
            sources,
            output_path: None,
            webhook: None,
            stages,
        });
    }

    write_reviews_json(&config.output_path, &reviews)?;
    enter(&mut stages, RunStage::Persisted);
    log::info!(
        "Scraping completed successfully. Data saved to {}",
        config.output_path.display()
    );

    let webhook = match &config.webhook_url {
        Some(url) => {
            let outcome = WebhookNotifier::new(url.as_str()).deliver(&reviews).await;
            enter(&mut stages, RunStage::Notified);
            outcome
        }
        None => {
            log::warn!("No webhook URL provided. Data was not sent.");
            WebhookOutcome::NotConfigured
        }
    };

    enter(&mut stages, RunStage::Done);

    Ok(RunSummary {
        reviews,
        sources,
        output_path: Some(config.output_path.clone()),
        webhook: Some(webhook),
        stages,
    })
}
