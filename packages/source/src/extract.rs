//! Per-field extraction with ordered fallback strategies.
//!
//! A field is read by trying its locator strategies in priority order. The
//! first strategy that finds a sub-element with non-empty trimmed text wins;
//! when none does, the field's declared default is used. A failed lookup
//! only ever affects its own field, with one exception: a structural error
//! (the record node itself vanished) is returned so the caller can drop the
//! whole record.

use review_harvest_browser::{BrowserError, Element, Locator};

use crate::rating::{normalize_rating, parse_fraction_rating};
use crate::source_def::{FieldSpec, RatingScale, RatingSpec};

/// Returns the trimmed text of the first strategy that yields any.
///
/// # Errors
///
/// Returns [`BrowserError`] only for structural failures; every other
/// lookup error skips to the next strategy.
pub async fn extract_text(
    node: &dyn Element,
    strategies: &[Locator],
) -> Result<Option<String>, BrowserError> {
    for locator in strategies {
        let element = match node.find(locator).await {
            Ok(Some(element)) => element,
            Ok(None) => continue,
            Err(e) if e.is_structural() => return Err(e),
            Err(e) => {
                log::debug!("Lookup by {locator} failed: {e}");
                continue;
            }
        };
        match element.text().await {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Ok(Some(trimmed.to_owned()));
                }
            }
            Err(e) if e.is_structural() => return Err(e),
            Err(e) => log::debug!("Reading text of {locator} failed: {e}"),
        }
    }
    Ok(None)
}

/// Extracts one text field, falling back to its declared default.
///
/// # Errors
///
/// Returns [`BrowserError`] only when the record node itself is gone.
pub async fn extract_field(
    node: &dyn Element,
    field: &str,
    spec: &FieldSpec,
) -> Result<String, BrowserError> {
    let value = extract_text(node, &spec.strategies)
        .await?
        .map(|text| strip_fragments(text, &spec.remove))
        .filter(|text| !text.is_empty());

    Ok(value.unwrap_or_else(|| {
        log::debug!("No value for {field}, using default {:?}", spec.default);
        spec.default.clone()
    }))
}

fn strip_fragments(text: String, fragments: &[String]) -> String {
    if fragments.is_empty() {
        return text;
    }
    fragments
        .iter()
        .fold(text, |acc, fragment| acc.replace(fragment.as_str(), ""))
        .trim()
        .to_owned()
}

/// Extracts the rating according to its native scale.
///
/// Returns `0.0` when no strategy yields a usable value.
///
/// # Errors
///
/// Returns [`BrowserError`] only when the record node itself is gone.
pub async fn extract_rating(node: &dyn Element, spec: &RatingSpec) -> Result<f64, BrowserError> {
    match spec.scale {
        RatingScale::Fraction => {
            let Some(text) = extract_text(node, &spec.strategies).await? else {
                log::debug!("No rating element found");
                return Ok(0.0);
            };
            Ok(parse_fraction_rating(&text).unwrap_or_else(|| {
                log::warn!("Could not extract rating from {text:?}");
                0.0
            }))
        }
        RatingScale::Normalized => {
            for locator in &spec.strategies {
                if let Some(text) = extract_text(node, std::slice::from_ref(locator)).await? {
                    let score = normalize_rating(&text);
                    if score > 0.0 {
                        return Ok(score);
                    }
                }
            }
            Ok(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use review_harvest_browser::snapshot::{SnapshotPage, SnapshotSite};
    use review_harvest_browser::{ElementRef, Page};

    use super::*;

    const URL: &str = "https://example.test/reviews";

    const DOCUMENT: &str = r#"<html><body>
        <div class="review">
            <span class="blank">   </span>
            <span class="name">  Mehmet Y.  </span>
            <span class="date">Google
, 3 months ago</span>
            <span class="fraction">4/5</span>
            <div class="zero-score">0</div>
            <div class="score">Puan 8,5</div>
        </div>
        <div class="review" data-snapshot-detached>
            <span class="name">Vanished</span>
        </div>
    </body></html>"#;

    fn css(selector: &str) -> Locator {
        Locator::Css(selector.to_string())
    }

    fn spec(strategies: Vec<Locator>, default: &str) -> FieldSpec {
        FieldSpec {
            strategies,
            default: default.to_string(),
            remove: Vec::new(),
        }
    }

    async fn reviews() -> Vec<ElementRef> {
        let page = SnapshotPage::new(SnapshotSite::new().with_document(URL, DOCUMENT));
        page.goto(URL).await.unwrap();
        page.find_all(&css("div.review")).await.unwrap()
    }

    #[tokio::test]
    async fn empty_strategy_list_returns_default() {
        let nodes = reviews().await;
        let value = extract_field(nodes[0].as_ref(), "customer_name", &spec(vec![], "-"))
            .await
            .unwrap();
        assert_eq!(value, "-");
    }

    #[tokio::test]
    async fn all_strategies_failing_returns_default() {
        let nodes = reviews().await;
        let value = extract_field(
            nodes[0].as_ref(),
            "customer_name",
            &spec(vec![css(".missing"), css(".blank")], "Anonymous"),
        )
        .await
        .unwrap();
        assert_eq!(value, "Anonymous");
    }

    #[tokio::test]
    async fn first_non_empty_strategy_wins() {
        let nodes = reviews().await;
        let value = extract_field(
            nodes[0].as_ref(),
            "customer_name",
            &spec(
                vec![
                    css(".missing"),
                    Locator::Xpath("//span".to_string()),
                    css(".blank"),
                    Locator::Class("name".to_string()),
                    css(".date"),
                ],
                "-",
            ),
        )
        .await
        .unwrap();
        assert_eq!(value, "Mehmet Y.");
    }

    #[tokio::test]
    async fn removes_configured_fragments() {
        let nodes = reviews().await;
        let mut date = spec(vec![css(".date")], "-");
        date.remove = vec!["Google\n, ".to_string()];
        let value = extract_field(nodes[0].as_ref(), "stay_date", &date)
            .await
            .unwrap();
        assert_eq!(value, "3 months ago");
    }

    #[tokio::test]
    async fn detached_record_is_an_error() {
        let nodes = reviews().await;
        let err = extract_field(nodes[1].as_ref(), "customer_name", &spec(vec![css(".name")], "-"))
            .await
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[tokio::test]
    async fn fraction_rating_uses_numerator() {
        let nodes = reviews().await;
        let rating = extract_rating(
            nodes[0].as_ref(),
            &RatingSpec {
                strategies: vec![css(".fraction")],
                scale: RatingScale::Fraction,
            },
        )
        .await
        .unwrap();
        assert!((rating - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unparseable_fraction_rating_is_zero() {
        let nodes = reviews().await;
        let rating = extract_rating(
            nodes[0].as_ref(),
            &RatingSpec {
                strategies: vec![css(".name")],
                scale: RatingScale::Fraction,
            },
        )
        .await
        .unwrap();
        assert!(rating.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn normalized_rating_skips_zero_scores() {
        let nodes = reviews().await;
        let rating = extract_rating(
            nodes[0].as_ref(),
            &RatingSpec {
                strategies: vec![css(".missing"), css(".zero-score"), css(".score")],
                scale: RatingScale::Normalized,
            },
        )
        .await
        .unwrap();
        assert!((rating - 8.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn missing_normalized_rating_is_zero() {
        let nodes = reviews().await;
        let rating = extract_rating(
            nodes[0].as_ref(),
            &RatingSpec {
                strategies: vec![css(".missing")],
                scale: RatingScale::Normalized,
            },
        )
        .await
        .unwrap();
        assert!(rating.abs() < f64::EPSILON);
    }
}
