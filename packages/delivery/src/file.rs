//! JSON file output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use review_harvest_review_models::StandardizedReview;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Writes `reviews` to `path` as a JSON array indented by four spaces.
///
/// Non-ASCII text is written as-is (UTF-8), not escaped. An existing file
/// is overwritten.
///
/// # Errors
///
/// Returns [`DeliveryError`](crate::DeliveryError) if the file cannot be
/// created or written.
pub fn write_reviews_json(
    path: &Path,
    reviews: &[StandardizedReview],
) -> Result<(), crate::DeliveryError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    reviews.serialize(&mut serializer)?;
    writer.flush()?;

    log::info!("Wrote {} reviews to {}", reviews.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use review_harvest_review_models::ReviewSource;

    use super::*;

    fn review(name: &str, source: ReviewSource, page: Option<u32>) -> StandardizedReview {
        StandardizedReview {
            customer_name: name.to_string(),
            stay_date: "Ekim 2024".to_string(),
            review_text: "Çok güzel bir otel".to_string(),
            rating: 9.2,
            source,
            page,
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("review_harvest_delivery_{name}.json"))
    }

    #[test]
    fn writes_indented_utf8_array() {
        let path = temp_path("indented");
        write_reviews_json(&path, &[review("Şule", ReviewSource::BookingCom, Some(1))]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[\n    {\n        \"customer_name\": \"Şule\""));
        assert!(written.contains("Çok güzel bir otel"));
        assert!(written.contains("\"source\": \"Booking.com\""));
        assert!(written.contains("\"page\": 1"));

        let parsed: Vec<serde_json::Value> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.len(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn overwrites_existing_file() {
        let path = temp_path("overwrite");
        std::fs::write(&path, "stale contents that are longer than the new array").unwrap();

        write_reviews_json(
            &path,
            &[
                review("Ali", ReviewSource::GoogleMaps, None),
                review("Can", ReviewSource::GoogleMaps, None),
            ],
        )
        .unwrap();

        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].get("page").is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let path = std::env::temp_dir()
            .join("review_harvest_delivery_missing_dir")
            .join("nested")
            .join("out.json");
        let err = write_reviews_json(&path, &[]).unwrap_err();
        assert!(matches!(err, crate::DeliveryError::Io(_)));
    }
}
