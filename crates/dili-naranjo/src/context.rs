//! Patient facts handed to the reasoning service.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use dili_core::{DrugTimeline, drug_timelines};
use dili_model::{ClassificationResult, GradePoint, IciAllowList, PatientDrugData, usable_name};

/// Everything the reasoning service needs to answer questions 3-5.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaranjoContext {
    pub ici_drugs: Vec<String>,
    pub toxic_drugs: Vec<String>,
    pub safe_drugs: Vec<String>,
    /// Exposure windows for the ICI and toxic drugs.
    pub drug_timeline: BTreeMap<String, DrugTimeline>,
    /// Grades where the value differs from the previous record.
    pub grade_changes: Vec<GradePoint>,
    pub total_days: i64,
}

impl NaranjoContext {
    pub fn build(
        data: &PatientDrugData,
        classification: &ClassificationResult,
        ici: &IciAllowList,
        grades: &[GradePoint],
    ) -> Self {
        let sets = classification.reference_sets();
        let mut ici_drugs = BTreeSet::new();
        let mut toxic_drugs = BTreeSet::new();
        let mut safe_drugs = BTreeSet::new();

        for record in data.records() {
            let Some(name) = usable_name(record.name) else {
                continue;
            };
            if ici.matches(record.concept_id, &name) {
                ici_drugs.insert(name);
            } else if sets.is_excluded(record.concept_id) {
                continue;
            } else if sets.is_toxic(record.concept_id, &name) {
                toxic_drugs.insert(name);
            } else {
                safe_drugs.insert(name);
            }
        }
        // a name seen with a toxic id elsewhere is not also safe
        safe_drugs.retain(|name| !toxic_drugs.contains(name));

        let drug_timeline = drug_timelines(data)
            .into_iter()
            .filter(|(name, _)| ici_drugs.contains(name) || toxic_drugs.contains(name))
            .collect();
        let total_days = data
            .day_span()
            .map_or(0, |(first, last)| last - first + 1);

        Self {
            ici_drugs: ici_drugs.into_iter().collect(),
            toxic_drugs: toxic_drugs.into_iter().collect(),
            safe_drugs: safe_drugs.into_iter().collect(),
            drug_timeline,
            grade_changes: grade_changes(grades),
            total_days,
        }
    }

    pub fn has_ici_exposure(&self) -> bool {
        !self.ici_drugs.is_empty()
    }
}

/// Keeps the first grade and every later point whose grade differs from the
/// one before it, in day order.
pub fn grade_changes(grades: &[GradePoint]) -> Vec<GradePoint> {
    let mut sorted = grades.to_vec();
    sorted.sort_by_key(|point| point.day);
    let mut changes: Vec<GradePoint> = Vec::new();
    for point in sorted {
        if changes.last().is_none_or(|last| last.grade != point.grade) {
            changes.push(point);
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use dili_core::{ClassifierOptions, classify_patient};
    use dili_model::{ConceptId, ToxicityReference};

    #[test]
    fn grade_changes_skip_repeats() {
        let grades = [
            GradePoint::new(3, 1),
            GradePoint::new(1, 0),
            GradePoint::new(2, 0),
            GradePoint::new(5, 1),
            GradePoint::new(6, 0),
        ];
        assert_eq!(
            grade_changes(&grades),
            [
                GradePoint::new(1, 0),
                GradePoint::new(3, 1),
                GradePoint::new(6, 0)
            ]
        );
    }

    #[test]
    fn build_splits_ici_toxic_and_safe() {
        let data = PatientDrugData::from_rows([
            (Some(ConceptId::from(42920398)), "Atezolizumab", 1),
            (Some(ConceptId::from(1545998)), "atorvastatin", 2),
            (Some(ConceptId::from(19019073)), "pantoprazole", 2),
            (Some(ConceptId::from(42920398)), "atezolizumab", 22),
        ]);
        let reference =
            ToxicityReference::from_pairs([(ConceptId::from(1545998), Some("atorvastatin"))]);
        let classification = classify_patient(&data, &reference, &ClassifierOptions::default());

        let context = NaranjoContext::build(
            &data,
            &classification,
            &IciAllowList::default(),
            &[GradePoint::new(1, 0), GradePoint::new(10, 2)],
        );

        assert_eq!(context.ici_drugs, ["atezolizumab"]);
        assert_eq!(context.toxic_drugs, ["atorvastatin"]);
        assert_eq!(context.safe_drugs, ["pantoprazole"]);
        assert_eq!(context.drug_timeline["atezolizumab"].end_day, 22);
        assert!(!context.drug_timeline.contains_key("pantoprazole"));
        assert_eq!(context.total_days, 22);
        assert_eq!(context.grade_changes.len(), 2);
        assert!(context.has_ici_exposure());
    }

    #[test]
    fn dropped_reference_entries_are_not_safe() {
        let data = PatientDrugData::from_rows([
            (Some(ConceptId::from(30)), "mystery", 1),
            (Some(ConceptId::from(19019073)), "pantoprazole", 1),
        ]);
        let reference = ToxicityReference::from_pairs([(ConceptId::from(30), Some("#REF!"))]);
        let classification = classify_patient(&data, &reference, &ClassifierOptions::default());

        let context =
            NaranjoContext::build(&data, &classification, &IciAllowList::default(), &[]);

        assert!(context.toxic_drugs.is_empty());
        assert_eq!(context.safe_drugs, ["pantoprazole"]);
    }
}
