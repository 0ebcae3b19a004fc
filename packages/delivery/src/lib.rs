#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Delivery of harvested reviews.
//!
//! A finished run is handed to two one-shot collaborators: [`file`] writes
//! the whole collection as a pretty-printed JSON array, and [`webhook`]
//! POSTs the same array to an HTTP endpoint.

pub mod file;
pub mod webhook;

pub use file::write_reviews_json;
pub use webhook::{WebhookNotifier, WebhookOutcome};

/// Errors that can occur while delivering reviews.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// I/O error (file create/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with something other than `200 OK`.
    #[error("Webhook returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
}
