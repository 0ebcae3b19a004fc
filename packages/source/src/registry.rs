//! Source registry. Loads every review source definition from the embedded
//! TOML configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`].

use review_harvest_review_models::ReviewSource;

use crate::source_def::{SourceDefinition, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("google_maps", include_str!("../sources/google_maps.toml")),
    ("booking", include_str!("../sources/booking.toml")),
];

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the definition for `source`, if one is configured.
#[must_use]
pub fn find_source(source: ReviewSource) -> Option<SourceDefinition> {
    all_sources().into_iter().find(|def| def.source == source)
}
