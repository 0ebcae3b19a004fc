#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Standardized customer review record.
//!
//! Every review-hosting site the harvester understands produces
//! [`StandardizedReview`] records. Records from different sources are
//! concatenated into one output collection, never merged.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Placeholder stored in text fields the source page did not provide.
pub const MISSING_FIELD: &str = "-";

/// Upper bound of the normalized rating scale.
pub const MAX_RATING: f64 = 10.0;

/// The review-hosting site a record was extracted from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReviewSource {
    /// Google Maps place reviews (single infinite-scroll pane).
    #[serde(rename = "Google Maps")]
    #[strum(serialize = "Google Maps")]
    GoogleMaps,
    /// Booking.com property reviews (paginated list).
    #[serde(rename = "Booking.com")]
    #[strum(serialize = "Booking.com")]
    BookingCom,
}

impl ReviewSource {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::GoogleMaps, Self::BookingCom]
    }
}

/// A customer review normalized to the shared output schema.
///
/// Created once per raw record and never mutated afterwards. Text fields
/// hold [`MISSING_FIELD`] (or a source-specific default such as
/// `"Anonymous"`) when the page did not expose a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedReview {
    /// Reviewer display name.
    pub customer_name: String,
    /// Stay or visit date, free-form as presented by the source.
    pub stay_date: String,
    /// Review body. Booking.com bodies are a positive/negative composite.
    pub review_text: String,
    /// Rating on the `0.0..=10.0` scale, `0.0` when unextractable.
    pub rating: f64,
    /// Site the record came from.
    pub source: ReviewSource,
    /// Result page the record was found on (paginated sources only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn source_display_matches_site_name() {
        assert_eq!(ReviewSource::GoogleMaps.to_string(), "Google Maps");
        assert_eq!(ReviewSource::BookingCom.as_ref(), "Booking.com");
        assert_eq!(
            ReviewSource::from_str("Booking.com").unwrap(),
            ReviewSource::BookingCom
        );
    }

    #[test]
    fn page_is_omitted_when_absent() {
        let review = StandardizedReview {
            customer_name: "Ayşe".to_string(),
            stay_date: MISSING_FIELD.to_string(),
            review_text: "Harika bir otel".to_string(),
            rating: 5.0,
            source: ReviewSource::GoogleMaps,
            page: None,
        };
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["source"], "Google Maps");
        assert_eq!(json["rating"], 5.0);
        assert!(json.get("page").is_none());
    }

    #[test]
    fn page_is_serialized_for_paginated_sources() {
        let review = StandardizedReview {
            customer_name: "Anonymous".to_string(),
            stay_date: MISSING_FIELD.to_string(),
            review_text: "Olumlu: \nOlumsuz:".to_string(),
            rating: 0.0,
            source: ReviewSource::BookingCom,
            page: Some(3),
        };
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["page"], 3);
        assert_eq!(json["source"], "Booking.com");
    }
}
