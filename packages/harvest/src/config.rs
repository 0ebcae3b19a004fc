//! Run configuration.

use std::path::PathBuf;

use review_harvest_review_models::ReviewSource;

use crate::HarvestError;

/// File the collected reviews are written to unless overridden.
pub const DEFAULT_OUTPUT_PATH: &str = "müşteri_yorumları.json";

/// Booking.com result pages read unless overridden.
pub const DEFAULT_BOOKING_PAGES: u32 = 5;

/// Largest accepted Booking.com page bound.
pub const MAX_BOOKING_PAGES: u32 = 20;

/// Everything one harvest run needs to know.
///
/// Built once from CLI flags or interactive answers and never changed
/// afterwards. The builder methods treat blank strings as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Google Maps place to read, if any.
    pub google_maps_url: Option<String>,
    /// Booking.com property to read, if any.
    pub booking_url: Option<String>,
    /// Upper bound on Booking.com result pages (1-20).
    pub booking_max_pages: u32,
    /// Endpoint that receives the collected reviews, if any.
    pub webhook_url: Option<String>,
    /// JSON output file.
    pub output_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            google_maps_url: None,
            booking_url: None,
            booking_max_pages: DEFAULT_BOOKING_PAGES,
            webhook_url: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

impl RunConfig {
    /// Creates a new configuration with the default page bound and output file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Google Maps place URL.
    #[must_use]
    pub fn with_google_maps_url(mut self, url: impl Into<String>) -> Self {
        self.google_maps_url = non_blank(url.into());
        self
    }

    /// Sets the Booking.com property URL.
    #[must_use]
    pub fn with_booking_url(mut self, url: impl Into<String>) -> Self {
        self.booking_url = non_blank(url.into());
        self
    }

    /// Sets how many Booking.com result pages are read.
    #[must_use]
    pub const fn with_booking_max_pages(mut self, pages: u32) -> Self {
        self.booking_max_pages = pages;
        self
    }

    /// Sets the webhook endpoint.
    #[must_use]
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = non_blank(url.into());
        self
    }

    /// Sets the JSON output file.
    #[must_use]
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Checks the invariants the builders cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidConfig`] if the page bound is out of
    /// range, a URL is blank or the output path is empty.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if !(1..=MAX_BOOKING_PAGES).contains(&self.booking_max_pages) {
            return Err(HarvestError::InvalidConfig {
                message: format!(
                    "Booking.com page count must be between 1 and {MAX_BOOKING_PAGES}, got {}",
                    self.booking_max_pages
                ),
            });
        }
        let urls = [
            ("Google Maps URL", &self.google_maps_url),
            ("Booking.com URL", &self.booking_url),
            ("webhook URL", &self.webhook_url),
        ];
        if let Some((name, _)) = urls
            .iter()
            .find(|(_, url)| url.as_deref().is_some_and(|u| u.trim().is_empty()))
        {
            return Err(HarvestError::InvalidConfig {
                message: format!("{name} is blank"),
            });
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(HarvestError::InvalidConfig {
                message: "output path is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Sources to read, in run order (Google Maps first).
    #[must_use]
    pub fn targets(&self) -> Vec<(ReviewSource, &str)> {
        ReviewSource::all()
            .iter()
            .filter_map(|&source| {
                let url = match source {
                    ReviewSource::GoogleMaps => self.google_maps_url.as_deref(),
                    ReviewSource::BookingCom => self.booking_url.as_deref(),
                };
                url.map(|url| (source, url))
            })
            .collect()
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
