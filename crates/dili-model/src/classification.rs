use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::ConceptId;
use crate::reference::ReferenceSets;

/// Toxic/safe partition of one patient's drug identifiers.
///
/// `toxic_ids` and `safe_ids` keep one element per administration event;
/// `toxic_ingredients` and `safe_names` are distinct. The position of an
/// ingredient in `toxic_ingredients` plus one is its index in
/// `toxic_index_map`.
///
/// `excluded_ids` holds ICI ids and ids whose reference ingredient is
/// undefined. They are in neither partition and stay out of the wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub toxic_ingredients: Vec<String>,
    #[serde(rename = "toxicId")]
    pub toxic_ids: Vec<ConceptId>,
    #[serde(rename = "safeId")]
    pub safe_ids: Vec<ConceptId>,
    pub safe_names: Vec<String>,
    pub toxic_index_map: BTreeMap<ConceptId, usize>,
    #[serde(skip)]
    pub excluded_ids: BTreeSet<ConceptId>,
}

impl ClassificationResult {
    /// 1-based ingredient index for a toxic identifier.
    pub fn ingredient_index(&self, id: &ConceptId) -> Option<usize> {
        self.toxic_index_map.get(id).copied()
    }

    pub fn ingredient_name(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|position| self.toxic_ingredients.get(position))
            .map(String::as_str)
    }

    /// Toxic and excluded lookup sets for the ratio engine.
    ///
    /// Safe lists are not carried over, so the engine counts every
    /// non-toxic, non-excluded drug unless the caller adds an explicit safe
    /// reference.
    pub fn reference_sets(&self) -> ReferenceSets {
        ReferenceSets::new()
            .with_toxic_ids(self.toxic_ids.iter().cloned())
            .with_toxic_names(&self.toxic_ingredients)
            .with_excluded_ids(self.excluded_ids.iter().cloned())
    }
}
