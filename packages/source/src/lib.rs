#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Config-driven review sources.
//!
//! Every supported site is described by a TOML [`SourceDefinition`]: how its
//! records are revealed (fixed-count scrolling or page-by-page traversal)
//! and which locator strategies yield each output field. [`collect_reviews`]
//! runs a definition against a browser [`Page`](review_harvest_browser::Page)
//! and returns [`StandardizedReview`](review_harvest_review_models::StandardizedReview)
//! records.

pub mod assemble;
pub mod collect;
pub mod extract;
pub mod progress;
pub mod rating;
pub mod registry;
pub mod reveal;
pub mod source_def;

use review_harvest_browser::BrowserError;

pub use collect::{CollectOptions, collect_reviews};
pub use source_def::SourceDefinition;

/// Errors that can occur while collecting from a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The browser failed in a way that ends the whole source run.
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// A source definition could not be parsed.
    #[error("Invalid source definition: {message}")]
    Definition {
        /// Description of what went wrong.
        message: String,
    },
}
