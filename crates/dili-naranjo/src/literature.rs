//! Literature search query checks.
//!
//! A reviewer's free-text query is validated for length and topic, rejected
//! when it looks like it carries personal data, and otherwise stripped of
//! patient numbers, measured values, facility names, emails, and phone
//! numbers before it is sent anywhere.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};
use serde::Serialize;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_QUERY_CHARS: usize = 500;

/// Outcome of [`validate_query`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "camelCase")]
pub enum QueryCheck {
    Valid,
    /// Usable, but unlikely to return relevant results.
    ValidWithWarning(String),
    Invalid(String),
}

impl QueryCheck {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::ValidWithWarning(message) | Self::Invalid(message) => Some(message),
        }
    }
}

/// A query ready to send, together with its validation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedQuery {
    pub query: String,
    pub check: QueryCheck,
}

static MEDICAL_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)drug|medication|hepatotoxicity|liver|pembrolizumab|amiodarone|paracetamol|naranjo|dili|alt|ast",
    )
    .expect("valid medical term pattern")
});

// Applied in order; later patterns see earlier replacements.
static REDACTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)patient\s+\d+", "patient"),
        (r"환자\s+\d+", "환자"),
        (r"\d+\.\d+", "[value]"),
        (r"(?i)hospital|clinic|medical center|병원|의원|센터", "medical facility"),
        (r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b", "[email]"),
        (r"\d{3}-\d{3,4}-\d{4}", "[phone]"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid redaction pattern"),
            replacement,
        )
    })
    .collect()
});

static SENSITIVE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)주민번호|social security|\bssn\b",
        r"(?i)전화번호|phone number|\btel\b",
        r"(?i)이름.*님|name.*mr|name.*ms",
        r"(?i)생년월일|date of birth|\bdob\b",
        r"\d{6}-\d{7}",
        r"\d{3}-\d{3,4}-\d{4}",
    ])
    .expect("valid sensitive data patterns")
});

/// Checks length bounds and warns when no medical term is present.
pub fn validate_query(query: &str) -> QueryCheck {
    if query.is_empty() {
        return QueryCheck::Invalid("Invalid query.".to_string());
    }
    if query.trim().chars().count() < MIN_QUERY_CHARS {
        return QueryCheck::Invalid(format!(
            "Search term must be at least {MIN_QUERY_CHARS} characters."
        ));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return QueryCheck::Invalid(format!(
            "Search term is too long. Please enter {MAX_QUERY_CHARS} characters or less."
        ));
    }
    if !MEDICAL_TERMS.is_match(query) {
        return QueryCheck::ValidWithWarning(
            "No medical terms detected. For more accurate results, please include drug names \
             or medical terms."
                .to_string(),
        );
    }
    QueryCheck::Valid
}

/// Replaces identifying details with generic placeholders.
pub fn sanitize_query(query: &str) -> String {
    let mut sanitized = query.to_string();
    for (pattern, replacement) in REDACTIONS.iter() {
        sanitized = pattern.replace_all(&sanitized, *replacement).into_owned();
    }
    sanitized.trim().to_string()
}

pub fn contains_sensitive_info(query: &str) -> bool {
    SENSITIVE.is_match(query)
}

/// Validates, screens for personal data, and sanitizes a query.
///
/// Queries that fail validation or mention personal data come back
/// `Invalid` with the sanitized text alongside.
pub fn prepare_query(query: &str) -> PreparedQuery {
    let sanitized = sanitize_query(query);
    let check = match validate_query(query) {
        QueryCheck::Invalid(message) => QueryCheck::Invalid(message),
        _ if contains_sensitive_info(query) => QueryCheck::Invalid(
            "Query appears to contain personal information.".to_string(),
        ),
        check => check,
    };
    PreparedQuery {
        query: sanitized,
        check,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_bounds() {
        assert!(!validate_query("").is_valid());
        assert!(!validate_query(" a ").is_valid());
        assert!(!validate_query(&"liver ".repeat(100)).is_valid());
        assert!(validate_query(&"a".repeat(MAX_QUERY_CHARS)).is_valid());
    }

    #[test]
    fn medical_terms_suppress_the_warning() {
        assert_eq!(validate_query("pembrolizumab hepatitis"), QueryCheck::Valid);
        assert_eq!(validate_query("Liver injury"), QueryCheck::Valid);
        assert!(matches!(
            validate_query("weekend plans"),
            QueryCheck::ValidWithWarning(_)
        ));
    }

    #[test]
    fn sanitize_removes_identifying_details() {
        assert_eq!(
            sanitize_query("  Patient 1234 at Seoul Hospital had ALT 3.5 "),
            "patient at Seoul medical facility had ALT [value]"
        );
        assert_eq!(
            sanitize_query("contact kim@example.org or 010-1234-5678"),
            "contact [email] or [phone]"
        );
        assert_eq!(sanitize_query("환자 12 간독성"), "환자 간독성");
    }

    #[test]
    fn sensitive_patterns() {
        assert!(contains_sensitive_info("patient DOB 1970"));
        assert!(contains_sensitive_info("id 900101-1234567"));
        assert!(contains_sensitive_info("call 010-1234-5678"));
        assert!(contains_sensitive_info("주민번호 확인"));
        assert!(!contains_sensitive_info("telmisartan hepatotoxicity"));
        assert!(!contains_sensitive_info("nivolumab liver injury"));
    }

    #[test]
    fn prepare_rejects_personal_data_and_keeps_warnings() {
        let prepared = prepare_query("nivolumab hepatitis, phone number 010-1234-5678");
        assert!(!prepared.check.is_valid());
        assert_eq!(prepared.query, "nivolumab hepatitis, phone number [phone]");

        let prepared = prepare_query("checkpoint inhibitor hepatitis at clinic");
        assert!(matches!(prepared.check, QueryCheck::ValidWithWarning(_)));
        assert_eq!(
            prepared.query,
            "checkpoint inhibitor hepatitis at medical facility"
        );
    }
}
