//! Drug name normalization shared by classification and ratio computation.

/// Marker some extracts use for a drug whose name could not be resolved.
pub const UNKNOWN_NAME: &str = "unknown";

/// Lowercases and trims a drug or ingredient name for comparison.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// True when a normalized name can take part in classification.
///
/// Empty names and the literal `unknown` are excluded everywhere.
pub fn is_usable_name(normalized: &str) -> bool {
    !normalized.is_empty() && normalized != UNKNOWN_NAME
}

/// Normalizes `raw` and returns it only if usable.
pub fn usable_name(raw: &str) -> Option<String> {
    let normalized = normalize_name(raw);
    is_usable_name(&normalized).then_some(normalized)
}
