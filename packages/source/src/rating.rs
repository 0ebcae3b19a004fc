//! Rating text parsing.
//!
//! Sources present ratings on different native scales, so there are two
//! deliberately separate paths:
//!
//! * [`normalize_rating`] for free-form scores on a 10-point scale
//!   (`"9,2"`, `"Puan: 8.0"`). The result is clamped to `0.0..=10.0`.
//! * [`parse_fraction_rating`] for `"N/5"` style text, where only the
//!   numerator is kept as-is. Running a 5-point value through the clamping
//!   normalizer would change it, so the two are never combined.

use review_harvest_review_models::MAX_RATING;

/// Normalizes free-form rating text to the `0.0..=10.0` scale, rounded to
/// one decimal place.
///
/// Every character other than decimal digits, `.` and `,` is dropped, a
/// comma decimal separator becomes a dot, and the remainder is parsed.
/// Decimal digits from other scripts (`"٩,٢"`) count as their ASCII
/// equivalents. Unparseable input yields `0.0`; values above 10 are
/// clamped. Never panics.
#[must_use]
pub fn normalize_rating(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| match c {
            '.' | ',' => Some(c),
            _ => decimal_digit(c),
        })
        .collect();
    let first_token = cleaned.split_whitespace().next().unwrap_or_default();
    let rating = first_token
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
        .min(MAX_RATING);
    round_to_tenth(rating)
}

/// Parses the numerator of `"N/5"` style rating text.
///
/// Returns `None` when the text before the first `/` is not a number.
#[must_use]
pub fn parse_fraction_rating(raw: &str) -> Option<f64> {
    raw.split('/')
        .next()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// First code point of each Unicode block of ten contiguous decimal digits.
const DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10,
];

fn decimal_digit(c: char) -> Option<char> {
    if !c.is_numeric() {
        return None;
    }
    let code = u32::from(c);
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .and_then(|&zero| char::from_digit(code - zero, 10))
}

/// Rounds to one decimal place from the exact binary value, so `8.65`
/// (stored just above the tie) becomes `8.7` and `0.35` (just below) `0.3`.
fn round_to_tenth(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(0.0)
}
