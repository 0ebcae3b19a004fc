//! Building [`StandardizedReview`]s from raw record nodes.

use review_harvest_browser::{BrowserError, Element, ElementRef};
use review_harvest_review_models::StandardizedReview;

use crate::extract::{extract_field, extract_rating};
use crate::source_def::{ReviewTextSpec, SourceDefinition};

/// Extracts every field of one record node.
///
/// Missing fields fall back to their defaults, so this only fails when the
/// node itself has become unusable.
///
/// # Errors
///
/// Returns a structural [`BrowserError`] if the node detached mid-read.
pub async fn assemble_review(
    node: &dyn Element,
    definition: &SourceDefinition,
    page: Option<u32>,
) -> Result<StandardizedReview, BrowserError> {
    let fields = &definition.fields;

    let customer_name = extract_field(node, "customer_name", &fields.customer_name).await?;
    let stay_date = extract_field(node, "stay_date", &fields.stay_date).await?;
    let review_text = match &fields.review_text {
        ReviewTextSpec::Single(spec) => extract_field(node, "review_text", spec).await?,
        ReviewTextSpec::Composite(spec) => {
            let positive = extract_field(node, "positive_text", &spec.positive).await?;
            let negative = extract_field(node, "negative_text", &spec.negative).await?;
            spec.compose(&positive, &negative)
        }
    };
    let rating = extract_rating(node, &fields.rating).await?;

    Ok(StandardizedReview {
        customer_name,
        stay_date,
        review_text,
        rating,
        source: definition.source,
        page,
    })
}

/// Assembles every node in order, skipping the ones that fail.
pub async fn assemble_reviews(
    nodes: &[ElementRef],
    definition: &SourceDefinition,
    page: Option<u32>,
) -> Vec<StandardizedReview> {
    let mut reviews = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        match assemble_review(node.as_ref(), definition, page).await {
            Ok(review) => reviews.push(review),
            Err(e) => log::warn!(
                "Error processing {} review {}: {e}",
                definition.name(),
                index + 1
            ),
        }
    }
    reviews
}

#[cfg(test)]
mod tests {
    use review_harvest_browser::snapshot::{SnapshotPage, SnapshotSite};
    use review_harvest_browser::{Locator, Page};
    use review_harvest_review_models::ReviewSource;

    use super::*;
    use crate::registry::find_source;

    const URL: &str = "https://booking.example.test/hotel";

    const BOOKING_PAGE: &str = r#"<html><body>
        <div data-testid="review">
            <div class="a3332d346a">Ayşe</div>
            <span data-testid="review-stay-date">Ekim 2024</span>
            <div data-testid="review-positive-text">Temiz oda</div>
            <div data-testid="review-negative-text">Gürültülü</div>
            <div data-testid="review-score"><div>Puan 9,2</div></div>
        </div>
        <div data-testid="review">
            <div data-testid="review-negative-text">Kahvaltı zayıftı</div>
        </div>
        <div data-testid="review" data-snapshot-detached>
            <div class="a3332d346a">Gone</div>
        </div>
    </body></html>"#;

    async fn booking_nodes() -> Vec<ElementRef> {
        let page = SnapshotPage::new(SnapshotSite::new().with_document(URL, BOOKING_PAGE));
        page.goto(URL).await.unwrap();
        page.find_all(&Locator::Css("div[data-testid='review']".to_string()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn assembles_complete_booking_record() {
        let definition = find_source(ReviewSource::BookingCom).unwrap();
        let nodes = booking_nodes().await;

        let review = assemble_review(nodes[0].as_ref(), &definition, Some(2))
            .await
            .unwrap();

        assert_eq!(review.customer_name, "Ayşe");
        assert_eq!(review.stay_date, "Ekim 2024");
        assert_eq!(review.review_text, "Olumlu: Temiz oda\nOlumsuz: Gürültülü");
        assert!((review.rating - 9.2).abs() < f64::EPSILON);
        assert_eq!(review.source, ReviewSource::BookingCom);
        assert_eq!(review.page, Some(2));
    }

    #[tokio::test]
    async fn sparse_booking_record_uses_defaults() {
        let definition = find_source(ReviewSource::BookingCom).unwrap();
        let nodes = booking_nodes().await;

        let review = assemble_review(nodes[1].as_ref(), &definition, Some(1))
            .await
            .unwrap();

        assert_eq!(review.customer_name, "Anonymous");
        assert_eq!(review.stay_date, "-");
        assert_eq!(review.review_text, "Olumlu: \nOlumsuz: Kahvaltı zayıftı");
        assert!(review.rating.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn detached_records_are_skipped() {
        let definition = find_source(ReviewSource::BookingCom).unwrap();
        let nodes = booking_nodes().await;

        let reviews = assemble_reviews(&nodes, &definition, Some(1)).await;

        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].customer_name, "Ayşe");
    }
}
