#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;

/// Opaque drug concept identifier (e.g. an OMOP `drug_concept_id`).
///
/// Identifiers are compared as trimmed strings, so `42920398` read from a
/// numeric column and `" 42920398"` read from a text column are equal.
/// On the wire an identifier is either a string or an integer; it is
/// always written back as a string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "RawConceptId")]
pub struct ConceptId(String);

impl ConceptId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidConceptId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parses a raw cell, treating blank and null-like cells as absent.
    pub fn parse_optional(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ConceptId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ConceptId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Identifier as it appears in JSON rows: text or a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawConceptId {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

impl RawConceptId {
    /// Blank and null-like text becomes `None`, as with [`ConceptId::parse_optional`].
    pub fn into_optional(self) -> Option<ConceptId> {
        match self {
            Self::Signed(value) => Some(ConceptId::from(value)),
            Self::Unsigned(value) => Some(ConceptId(value.to_string())),
            Self::Text(value) => ConceptId::parse_optional(&value),
        }
    }
}

impl TryFrom<RawConceptId> for ConceptId {
    type Error = ModelError;

    fn try_from(raw: RawConceptId) -> Result<Self, ModelError> {
        match raw {
            RawConceptId::Signed(value) => Ok(Self::from(value)),
            RawConceptId::Unsigned(value) => Ok(Self(value.to_string())),
            RawConceptId::Text(value) => Self::new(value),
        }
    }
}

/// Deserializes an identifier column where blank cells mean "no id".
pub fn deserialize_optional_ids<'de, D>(
    deserializer: D,
) -> Result<Vec<Option<ConceptId>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Option<RawConceptId>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|id| id.and_then(RawConceptId::into_optional))
        .collect())
}
