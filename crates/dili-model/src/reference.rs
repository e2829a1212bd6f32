//! Toxicity references, the ICI allow-list, and normalized lookup sets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::ConceptId;
use crate::name::{normalize_name, usable_name};

/// Externally supplied hepatotoxic drug list: concept id to ingredient.
///
/// An ingredient of `None` models a listed id whose ingredient cell was
/// empty; the classifier drops such ids instead of calling them safe.
/// Duplicate ids keep the last ingredient seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToxicityReference {
    entries: BTreeMap<ConceptId, Option<String>>,
}

impl ToxicityReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (ConceptId, Option<S>)>,
        S: Into<String>,
    {
        let mut reference = Self::new();
        for (id, ingredient) in pairs {
            reference.insert(id, ingredient.map(Into::into));
        }
        reference
    }

    pub fn insert(&mut self, id: ConceptId, ingredient: Option<String>) {
        self.entries.insert(id, ingredient);
    }

    pub fn contains_id(&self, id: &ConceptId) -> bool {
        self.entries.contains_key(id)
    }

    /// `None` when the id is not listed; `Some(None)` when listed without an ingredient.
    pub fn ingredient(&self, id: &ConceptId) -> Option<Option<&str>> {
        self.entries.get(id).map(Option::as_deref)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ConceptId> {
        self.entries.keys()
    }

    /// Distinct normalized ingredient names, empty cells skipped.
    pub fn normalized_ingredients(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .flatten()
            .map(|name| normalize_name(name))
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Concept ids of the default immune checkpoint inhibitor products.
pub const DEFAULT_ICI_CONCEPT_IDS: &[&str] = &[
    "42920398", "1594046", "1594038", "46275962", "42920744", "42922127", "42921578",
];

/// Ingredient names of immune checkpoint inhibitors.
pub const DEFAULT_ICI_NAMES: &[&str] = &[
    "atezolizumab",
    "pembrolizumab",
    "nivolumab",
    "durvalumab",
    "avelumab",
    "ipilimumab",
    "cemiplimab",
    "tislelizumab",
    "camrelizumab",
];

/// Immune checkpoint inhibitors under causality review.
///
/// Classifier exclusion is id-based only. Names are used to locate ICI
/// exposure on the patient timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IciAllowList {
    ids: BTreeSet<ConceptId>,
    names: BTreeSet<String>,
}

impl Default for IciAllowList {
    fn default() -> Self {
        Self::new(
            DEFAULT_ICI_CONCEPT_IDS
                .iter()
                .filter_map(|id| ConceptId::parse_optional(id)),
            DEFAULT_ICI_NAMES.iter().copied(),
        )
    }
}

impl IciAllowList {
    pub fn new<I, N, S>(ids: I, names: N) -> Self
    where
        I: IntoIterator<Item = ConceptId>,
        N: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ids: ids.into_iter().collect(),
            names: names
                .into_iter()
                .filter_map(|name| usable_name(name.as_ref()))
                .collect(),
        }
    }

    /// An allow-list that excludes nothing.
    pub fn empty() -> Self {
        Self {
            ids: BTreeSet::new(),
            names: BTreeSet::new(),
        }
    }

    pub fn contains_id(&self, id: &ConceptId) -> bool {
        self.ids.contains(id)
    }

    /// True when either the id or the normalized name identifies an ICI.
    pub fn matches(&self, id: Option<&ConceptId>, normalized_name: &str) -> bool {
        id.is_some_and(|id| self.ids.contains(id)) || self.names.contains(normalized_name)
    }
}

/// Normalized toxic and safe lookup sets consumed by the ratio engine.
///
/// When no safe id or name is supplied at all, every non-toxic drug counts
/// as safe; see [`ReferenceSets::has_safe`]. Rows with an excluded id are
/// never counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSets {
    toxic_ids: BTreeSet<ConceptId>,
    toxic_names: BTreeSet<String>,
    safe_ids: BTreeSet<ConceptId>,
    safe_names: BTreeSet<String>,
    excluded_ids: BTreeSet<ConceptId>,
}

impl ReferenceSets {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_toxic_ids<I: IntoIterator<Item = ConceptId>>(mut self, ids: I) -> Self {
        self.toxic_ids.extend(ids);
        self
    }

    #[must_use]
    pub fn with_toxic_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.toxic_names.extend(normalized(names));
        self
    }

    #[must_use]
    pub fn with_safe_ids<I: IntoIterator<Item = ConceptId>>(mut self, ids: I) -> Self {
        self.safe_ids.extend(ids);
        self
    }

    #[must_use]
    pub fn with_safe_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.safe_names.extend(normalized(names));
        self
    }

    #[must_use]
    pub fn with_excluded_ids<I: IntoIterator<Item = ConceptId>>(mut self, ids: I) -> Self {
        self.excluded_ids.extend(ids);
        self
    }

    /// Toxic ids and ingredient names taken straight from a reference list.
    pub fn from_reference(reference: &ToxicityReference) -> Self {
        Self::new()
            .with_toxic_ids(reference.ids().cloned())
            .with_toxic_names(reference.normalized_ingredients())
    }

    /// True iff an explicit safe reference (ids or names) was supplied.
    pub fn has_safe(&self) -> bool {
        !self.safe_ids.is_empty() || !self.safe_names.is_empty()
    }

    /// Name or id match; either signal is enough.
    pub fn is_toxic(&self, id: Option<&ConceptId>, normalized_name: &str) -> bool {
        self.toxic_names.contains(normalized_name)
            || id.is_some_and(|id| self.toxic_ids.contains(id))
    }

    pub fn is_excluded(&self, id: Option<&ConceptId>) -> bool {
        id.is_some_and(|id| self.excluded_ids.contains(id))
    }

    pub fn is_listed_safe(&self, id: Option<&ConceptId>, normalized_name: &str) -> bool {
        self.safe_names.contains(normalized_name)
            || id.is_some_and(|id| self.safe_ids.contains(id))
    }

    pub fn toxic_names(&self) -> &BTreeSet<String> {
        &self.toxic_names
    }

    pub fn safe_names(&self) -> &BTreeSet<String> {
        &self.safe_names
    }
}

fn normalized<I, S>(names: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| normalize_name(name.as_ref()))
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ici_list_matches_by_id_and_name() {
        let ici = IciAllowList::default();
        assert!(ici.contains_id(&ConceptId::from(42920398)));
        assert!(ici.matches(None, "nivolumab"));
        assert!(!ici.matches(Some(&ConceptId::from(1)), "aspirin"));
    }

    #[test]
    fn reference_keeps_last_duplicate() {
        let reference = ToxicityReference::from_pairs([
            (ConceptId::from(1), Some("Acetaminophen")),
            (ConceptId::from(1), Some("paracetamol")),
        ]);
        assert_eq!(reference.len(), 1);
        assert_eq!(
            reference.ingredient(&ConceptId::from(1)),
            Some(Some("paracetamol"))
        );
    }

    #[test]
    fn safe_flag_tracks_any_safe_input() {
        let sets = ReferenceSets::new().with_toxic_names(["Acetaminophen"]);
        assert!(!sets.has_safe());
        assert!(sets.is_toxic(None, "acetaminophen"));
        let sets = sets.with_safe_ids([ConceptId::from(9)]);
        assert!(sets.has_safe());
    }

    #[test]
    fn excluded_ids_do_not_count_as_safe_input() {
        let sets = ReferenceSets::new().with_excluded_ids([ConceptId::from(30)]);
        assert!(!sets.has_safe());
        assert!(sets.is_excluded(Some(&ConceptId::from(30))));
        assert!(!sets.is_excluded(None));
    }
}
