//! Toxic/safe partitioning of a patient's drug identifiers.
//!
//! An entry is toxic when its concept id is listed in the toxicity
//! reference or its normalized name equals a listed ingredient. Toxic wins
//! whenever either signal fires. Entries on the ICI allow-list are the
//! exposure under review and are left out of both partitions.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use dili_model::{
    ClassificationResult, ConceptId, DrugEntry, IciAllowList, ModelError, PatientDrugData,
    ToxicityReference, normalize_name, usable_name,
};

/// Spreadsheet error marker found in exported toxicity lists.
pub const DEFAULT_INVALID_INGREDIENT_MARKERS: &[&str] = &["#REF!"];

/// Classifier configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierOptions {
    /// Drugs excluded from toxic classification.
    pub ici: IciAllowList,
    /// Ingredient values treated as undefined (compared case-insensitively).
    pub invalid_ingredient_markers: Vec<String>,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            ici: IciAllowList::default(),
            invalid_ingredient_markers: DEFAULT_INVALID_INGREDIENT_MARKERS
                .iter()
                .map(|marker| (*marker).to_string())
                .collect(),
        }
    }
}

impl ClassifierOptions {
    #[must_use]
    pub fn with_ici(mut self, ici: IciAllowList) -> Self {
        self.ici = ici;
        self
    }

    #[must_use]
    pub fn with_invalid_marker(mut self, marker: impl Into<String>) -> Self {
        self.invalid_ingredient_markers.push(marker.into());
        self
    }

    fn is_invalid_ingredient(&self, ingredient: &str) -> bool {
        let trimmed = ingredient.trim();
        trimmed.is_empty()
            || self
                .invalid_ingredient_markers
                .iter()
                .any(|marker| marker.trim().eq_ignore_ascii_case(trimmed))
    }
}

/// How a single entry was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Toxic(String),
    Safe,
    /// Matched the reference but its ingredient is undefined or a sentinel.
    Dropped,
}

/// Partitions `entries` into toxic and safe identifiers.
pub fn classify(
    entries: &[DrugEntry],
    reference: &ToxicityReference,
    options: &ClassifierOptions,
) -> ClassificationResult {
    let toxic_names = reference.normalized_ingredients();
    let mut result = ClassificationResult::default();
    let mut ingredient_indexes: BTreeMap<String, usize> = BTreeMap::new();
    let mut seen_safe_names: BTreeSet<String> = BTreeSet::new();
    let mut ici_excluded = 0usize;
    let mut blank = 0usize;
    let mut dropped = 0usize;

    for entry in entries {
        let id = entry.concept_id.as_ref();
        let name = entry.name.as_deref().and_then(usable_name);
        if id.is_none() && name.is_none() {
            blank += 1;
            continue;
        }
        if let Some(id) = id.filter(|id| options.ici.contains_id(id)) {
            ici_excluded += 1;
            result.excluded_ids.insert(id.clone());
            continue;
        }
        match resolve(id, name.as_deref(), reference, &toxic_names, options) {
            Resolution::Toxic(ingredient) => {
                let next_index = ingredient_indexes.len() + 1;
                let index = *ingredient_indexes
                    .entry(ingredient.clone())
                    .or_insert_with(|| {
                        result.toxic_ingredients.push(ingredient);
                        next_index
                    });
                if let Some(id) = id {
                    result.toxic_ids.push(id.clone());
                    result.toxic_index_map.entry(id.clone()).or_insert(index);
                }
            }
            Resolution::Safe => {
                if let Some(id) = id {
                    result.safe_ids.push(id.clone());
                }
                if let Some(name) = name
                    && seen_safe_names.insert(name.clone())
                {
                    result.safe_names.push(name);
                }
            }
            Resolution::Dropped => {
                dropped += 1;
                if let Some(id) = id {
                    result.excluded_ids.insert(id.clone());
                }
                warn!(
                    concept_id = id.map(ConceptId::as_str).unwrap_or_default(),
                    "toxic reference entry has no valid ingredient; dropped"
                );
            }
        }
    }

    debug!(
        entries = entries.len(),
        toxic_events = result.toxic_ids.len(),
        toxic_ingredients = result.toxic_ingredients.len(),
        safe_events = result.safe_ids.len(),
        ici_excluded,
        blank,
        dropped,
        "classified drug entries"
    );
    result
}

fn resolve(
    id: Option<&ConceptId>,
    name: Option<&str>,
    reference: &ToxicityReference,
    toxic_names: &BTreeSet<String>,
    options: &ClassifierOptions,
) -> Resolution {
    let ingredient = match id.and_then(|id| reference.ingredient(id)) {
        Some(ingredient) => ingredient.map(normalize_name),
        None => match name {
            Some(name) if toxic_names.contains(name) => Some(name.to_string()),
            _ => return Resolution::Safe,
        },
    };
    match ingredient {
        Some(ingredient) if !options.is_invalid_ingredient(&ingredient) => {
            Resolution::Toxic(ingredient)
        }
        _ => Resolution::Dropped,
    }
}

/// Classifies every administration event of one patient.
pub fn classify_patient(
    data: &PatientDrugData,
    reference: &ToxicityReference,
    options: &ClassifierOptions,
) -> ClassificationResult {
    classify(&data.entries(), reference, options)
}

/// Column-oriented entry point: fails fast on misaligned columns.
pub fn classify_columns(
    concept_ids: &[Option<ConceptId>],
    names: &[Option<String>],
    reference: &ToxicityReference,
    options: &ClassifierOptions,
) -> Result<ClassificationResult, ModelError> {
    if names.len() != concept_ids.len() {
        return Err(ModelError::LengthMismatch {
            column: "drug_name",
            expected: concept_ids.len(),
            actual: names.len(),
        });
    }
    let entries: Vec<DrugEntry> = concept_ids
        .iter()
        .zip(names)
        .map(|(id, name)| DrugEntry::new(id.clone(), name.clone()))
        .collect();
    Ok(classify(&entries, reference, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: i64) -> ConceptId {
        ConceptId::from(value)
    }

    fn entry(value: i64, name: &str) -> DrugEntry {
        DrugEntry::new(Some(id(value)), Some(name.to_string()))
    }

    fn reference() -> ToxicityReference {
        ToxicityReference::from_pairs([
            (id(10), Some("Acetaminophen")),
            (id(11), Some("acetaminophen ")),
            (id(20), Some("atorvastatin")),
            (id(30), Some("#REF!")),
            (id(31), None),
        ])
    }

    #[test]
    fn indexes_ingredients_in_first_seen_order() {
        let entries = vec![entry(20, "x"), entry(10, "y"), entry(11, "z"), entry(20, "x")];
        let result = classify(&entries, &reference(), &ClassifierOptions::default());

        assert_eq!(result.toxic_ingredients, vec!["atorvastatin", "acetaminophen"]);
        assert_eq!(result.ingredient_index(&id(20)), Some(1));
        assert_eq!(result.ingredient_index(&id(10)), Some(2));
        assert_eq!(result.ingredient_index(&id(11)), Some(2));
        assert_eq!(result.ingredient_name(2), Some("acetaminophen"));
        // event-level ids keep duplicates
        assert_eq!(result.toxic_ids.len(), 4);
        assert!(result.safe_ids.is_empty());
    }

    #[test]
    fn sentinel_and_undefined_ingredients_are_dropped_from_both_sides() {
        let entries = vec![entry(30, "mystery"), entry(31, "other")];
        let result = classify(&entries, &reference(), &ClassifierOptions::default());
        assert!(result.toxic_ids.is_empty());
        assert!(result.safe_ids.is_empty());
        assert!(result.toxic_ingredients.is_empty());
        assert_eq!(
            result.excluded_ids.into_iter().collect::<Vec<_>>(),
            vec![id(30), id(31)]
        );
    }

    #[test]
    fn ici_ids_are_excluded_even_when_listed_toxic() {
        let ici = IciAllowList::new([id(20)], Vec::<String>::new());
        let options = ClassifierOptions::default().with_ici(ici);
        let result = classify(&[entry(20, "atorvastatin")], &reference(), &options);
        assert!(result.toxic_ids.is_empty());
        assert!(result.safe_ids.is_empty());
        assert!(result.excluded_ids.contains(&id(20)));
    }

    #[test]
    fn name_match_classifies_unlisted_id_as_toxic() {
        let result = classify(
            &[entry(99, " ACETAMINOPHEN ")],
            &reference(),
            &ClassifierOptions::default(),
        );
        assert_eq!(result.toxic_ids, vec![id(99)]);
        assert_eq!(result.ingredient_index(&id(99)), Some(1));
        assert!(result.safe_ids.is_empty());
    }

    #[test]
    fn unlisted_entries_are_safe() {
        let entries = vec![entry(50, "Aspirin"), entry(50, "aspirin"), entry(51, "unknown")];
        let result = classify(&entries, &reference(), &ClassifierOptions::default());
        assert_eq!(result.safe_ids, vec![id(50), id(50), id(51)]);
        assert_eq!(result.safe_names, vec!["aspirin"]);
    }

    #[test]
    fn blank_entries_are_skipped() {
        let entries = vec![DrugEntry::new(None, Some("Unknown".to_string()))];
        let result = classify(&entries, &reference(), &ClassifierOptions::default());
        assert_eq!(result, ClassificationResult::default());
    }

    #[test]
    fn misaligned_columns_fail_fast() {
        let err = classify_columns(
            &[Some(id(1)), Some(id(2))],
            &[Some("a".to_string())],
            &reference(),
            &ClassifierOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::LengthMismatch { actual: 1, .. }));
    }
}
