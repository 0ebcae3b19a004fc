//! Config-driven review source definition.
//!
//! [`SourceDefinition`] captures everything site-specific about a review
//! source: how to reveal the records on the page, and which locator
//! strategies to try (in priority order) for every output field. One
//! generic implementation drives every source; adding a site means adding
//! a TOML file, not code.

use review_harvest_browser::Locator;
use review_harvest_review_models::{MISSING_FIELD, ReviewSource};
use serde::Deserialize;

use crate::SourceError;

// ── Top-level source definition ──────────────────────────────────────────

/// A complete, config-driven review source definition.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"google_maps"`).
    pub id: String,
    /// Site recorded in every review this definition produces.
    pub source: ReviewSource,
    /// Pause after navigation before interacting with the page.
    #[serde(default)]
    pub load_settle_ms: u64,
    /// How to make records reachable in the page.
    pub reveal: RevealConfig,
    /// Locator strategies for each output field.
    pub fields: FieldMapping,
}

impl SourceDefinition {
    /// Returns the human-readable site name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.source.as_ref()
    }

    /// Returns whether this source spreads its records over result pages.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        matches!(self.reveal, RevealConfig::Paginated(_))
    }
}

// ── Reveal config ────────────────────────────────────────────────────────

/// How records are made reachable in the page.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RevealConfig {
    /// A single pane that loads more records as it is scrolled.
    InfiniteScroll(InfiniteScrollConfig),
    /// Numbered result pages with "show more" expanders.
    Paginated(PaginatedConfig),
}

/// The button that switches the page to its full review list.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenReviewsConfig {
    /// Candidate buttons, each waited for in turn. The first one found is
    /// clicked.
    pub candidates: Vec<Locator>,
    /// How long to wait for each candidate to appear.
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
    /// Pause between scrolling the button into view and clicking it.
    #[serde(default)]
    pub before_click_ms: u64,
    /// Pause after the click for the review list to render.
    #[serde(default)]
    pub after_click_ms: u64,
}

const fn default_wait_ms() -> u64 {
    10_000
}

/// Fixed-count scrolling of an infinite-scroll pane.
#[derive(Debug, Clone, Deserialize)]
pub struct InfiniteScrollConfig {
    /// Optional "all reviews" button to click first.
    #[serde(default)]
    pub open_reviews: Option<OpenReviewsConfig>,
    /// Scrollable pane holding the records. The window is scrolled when
    /// none of these match.
    #[serde(default)]
    pub container: Vec<Locator>,
    /// Raw record nodes. The first strategy with any match is used.
    pub records: Vec<Locator>,
    /// Number of scroll passes. Always performed in full.
    pub iterations: u32,
    /// Pixels scrolled per pass.
    pub scroll_delta_px: i64,
    /// Lower bound of the randomized pause after each pass.
    pub min_delay_ms: u64,
    /// Upper bound of the randomized pause after each pass.
    pub max_delay_ms: u64,
}

/// Page-by-page traversal of a paginated review list.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedConfig {
    /// Optional "read all reviews" button to click first.
    #[serde(default)]
    pub open_reviews: Option<OpenReviewsConfig>,
    /// Screen-height scroll steps per page.
    pub scroll_steps: u32,
    /// Pause after each scroll step.
    pub scroll_pause_ms: u64,
    /// "Show more" expanders clicked after every scroll step.
    pub show_more: Locator,
    /// Pause after each expander click.
    pub show_more_pause_ms: u64,
    /// Raw record nodes. The first strategy with any match is used for the
    /// whole page.
    pub records: Vec<Locator>,
    /// CSS selector template for the next-page control. `{page}` is
    /// replaced with the target page number.
    pub next_page: String,
    /// Pause between scrolling the next-page control into view and
    /// clicking it.
    pub next_page_settle_ms: u64,
    /// Pause after clicking the next-page control.
    pub next_page_pause_ms: u64,
}

impl PaginatedConfig {
    /// Returns the locator of the control leading to `page`.
    #[must_use]
    pub fn next_page_locator(&self, page: u32) -> Locator {
        Locator::Css(self.next_page.replace("{page}", &page.to_string()))
    }
}

// ── Field mapping ────────────────────────────────────────────────────────

/// Locator strategies for every output field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Reviewer display name.
    pub customer_name: FieldSpec,
    /// Stay or visit date.
    pub stay_date: FieldSpec,
    /// Review body.
    pub review_text: ReviewTextSpec,
    /// Rating.
    pub rating: RatingSpec,
}

/// Ordered locator strategies for a single text field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Tried in order; the first that yields non-empty text wins.
    #[serde(default)]
    pub strategies: Vec<Locator>,
    /// Value used when no strategy yields text.
    #[serde(default = "default_placeholder")]
    pub default: String,
    /// Literal fragments removed from the extracted text.
    #[serde(default)]
    pub remove: Vec<String>,
}

fn default_placeholder() -> String {
    MISSING_FIELD.to_owned()
}

/// How the review body is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReviewTextSpec {
    /// The body is one extracted field.
    Single(FieldSpec),
    /// The body joins labelled positive and negative remarks.
    Composite(CompositeTextSpec),
}

/// Labelled positive/negative review body.
#[derive(Debug, Clone, Deserialize)]
pub struct CompositeTextSpec {
    /// What the guest liked.
    pub positive: FieldSpec,
    /// What the guest disliked.
    pub negative: FieldSpec,
    /// Label preceding the positive text.
    pub positive_label: String,
    /// Label preceding the negative text.
    pub negative_label: String,
}

impl CompositeTextSpec {
    /// Joins the two remarks under their labels, trimmed as a whole.
    #[must_use]
    pub fn compose(&self, positive: &str, negative: &str) -> String {
        format!(
            "{} {positive}\n{} {negative}",
            self.positive_label, self.negative_label
        )
        .trim()
        .to_owned()
    }
}

/// Locator strategies and native scale for the rating.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingSpec {
    /// Tried in order.
    pub strategies: Vec<Locator>,
    /// How the located text is interpreted.
    pub scale: RatingScale,
}

/// How rating text is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingScale {
    /// `"N/5"` text; the numerator is used unchanged. The first located
    /// text decides.
    Fraction,
    /// Free-form 10-point score, normalized and clamped. The first strictly
    /// positive score wins.
    Normalized,
}

/// Parses a TOML string into a [`SourceDefinition`].
///
/// # Errors
///
/// Returns [`SourceError::Definition`] if the TOML is malformed or does not
/// describe a valid source.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, SourceError> {
    toml::de::from_str(toml_str).map_err(|e| SourceError::Definition {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        id = "minimal"
        source = "Google Maps"

        [reveal]
        type = "infinite_scroll"
        records = [{ css = "div.review" }]
        iterations = 2
        scroll_delta_px = 500
        min_delay_ms = 0
        max_delay_ms = 0

        [fields.customer_name]
        strategies = [{ css = ".name" }]

        [fields.stay_date]

        [fields.review_text]
        type = "single"
        strategies = [{ css = ".body" }]

        [fields.rating]
        strategies = [{ css = ".score" }]
        scale = "fraction"
    "#;

    #[test]
    fn parses_minimal_definition_with_defaults() {
        let def = parse_source_toml(MINIMAL).unwrap();
        assert_eq!(def.id, "minimal");
        assert_eq!(def.name(), "Google Maps");
        assert_eq!(def.load_settle_ms, 0);
        assert!(!def.is_paginated());
        assert_eq!(def.fields.customer_name.default, "-");
        assert!(def.fields.stay_date.strategies.is_empty());
        assert!(def.fields.stay_date.remove.is_empty());

        let RevealConfig::InfiniteScroll(scroll) = &def.reveal else {
            panic!("expected infinite scroll");
        };
        assert!(scroll.open_reviews.is_none());
        assert!(scroll.container.is_empty());
        assert_eq!(scroll.iterations, 2);
    }

    #[test]
    fn rejects_unknown_reveal_type() {
        let broken = MINIMAL.replace("infinite_scroll", "teleport");
        assert!(matches!(
            parse_source_toml(&broken),
            Err(SourceError::Definition { .. })
        ));
    }

    #[test]
    fn open_reviews_wait_defaults_to_ten_seconds() {
        let with_opener = format!(
            "{MINIMAL}\n[reveal.open_reviews]\ncandidates = [{{ css = \"button.all\" }}]\n"
        );
        let def = parse_source_toml(&with_opener).unwrap();
        let RevealConfig::InfiniteScroll(scroll) = &def.reveal else {
            panic!("expected infinite scroll");
        };
        let opener = scroll.open_reviews.as_ref().unwrap();
        assert_eq!(opener.wait_ms, 10_000);
        assert_eq!(opener.before_click_ms, 0);
    }

    #[test]
    fn composite_body_with_missing_remarks() {
        let spec = CompositeTextSpec {
            positive: FieldSpec {
                strategies: Vec::new(),
                default: String::new(),
                remove: Vec::new(),
            },
            negative: FieldSpec {
                strategies: Vec::new(),
                default: String::new(),
                remove: Vec::new(),
            },
            positive_label: "Olumlu:".to_string(),
            negative_label: "Olumsuz:".to_string(),
        };
        assert_eq!(spec.compose("", ""), "Olumlu: \nOlumsuz:");
        assert_eq!(
            spec.compose("Temiz oda", "Kahvaltı"),
            "Olumlu: Temiz oda\nOlumsuz: Kahvaltı"
        );
    }

    #[test]
    fn next_page_locator_fills_in_page_number() {
        let config = PaginatedConfig {
            open_reviews: None,
            scroll_steps: 3,
            scroll_pause_ms: 0,
            show_more: Locator::Css("button.more".to_string()),
            show_more_pause_ms: 0,
            records: vec![Locator::Css("div.review".to_string())],
            next_page: "button[aria-label=' {page}']".to_string(),
            next_page_settle_ms: 0,
            next_page_pause_ms: 0,
        };
        assert_eq!(
            config.next_page_locator(4),
            Locator::Css("button[aria-label=' 4']".to_string())
        );
    }
}
