//! Patient-level drug administration records.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::ids::{ConceptId, deserialize_optional_ids};

/// One identifier/name pair handed to the drug classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugEntry {
    pub concept_id: Option<ConceptId>,
    pub name: Option<String>,
}

impl DrugEntry {
    pub fn new(concept_id: Option<ConceptId>, name: Option<String>) -> Self {
        Self { concept_id, name }
    }

    /// Entry known only by its concept id.
    pub fn from_id(concept_id: ConceptId) -> Self {
        Self {
            concept_id: Some(concept_id),
            name: None,
        }
    }
}

/// A single drug-exposure event for a patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrugAdministration<'a> {
    pub concept_id: Option<&'a ConceptId>,
    pub name: &'a str,
    pub day: i64,
}

/// Index-aligned administration columns for one patient.
///
/// `names[i]` and `days[i]` describe the same event as `concept_ids[i]`.
/// Misaligned columns are rejected at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPatientDrugData", into = "RawPatientDrugData")]
pub struct PatientDrugData {
    concept_ids: Vec<Option<ConceptId>>,
    names: Vec<String>,
    days: Vec<i64>,
}

impl PatientDrugData {
    pub fn new(
        concept_ids: Vec<Option<ConceptId>>,
        names: Vec<String>,
        days: Vec<i64>,
    ) -> Result<Self> {
        let expected = concept_ids.len();
        if names.len() != expected {
            return Err(ModelError::LengthMismatch {
                column: "drug_name",
                expected,
                actual: names.len(),
            });
        }
        if days.len() != expected {
            return Err(ModelError::LengthMismatch {
                column: "days",
                expected,
                actual: days.len(),
            });
        }
        Ok(Self {
            concept_ids,
            names,
            days,
        })
    }

    /// Builds aligned columns from row tuples, which cannot be misaligned.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<ConceptId>, S, i64)>,
        S: Into<String>,
    {
        let mut data = Self::default();
        for (concept_id, name, day) in rows {
            data.push(concept_id, name, day);
        }
        data
    }

    pub fn push(&mut self, concept_id: Option<ConceptId>, name: impl Into<String>, day: i64) {
        self.concept_ids.push(concept_id);
        self.names.push(name.into());
        self.days.push(day);
    }

    pub fn len(&self) -> usize {
        self.concept_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concept_ids.is_empty()
    }

    pub fn concept_ids(&self) -> &[Option<ConceptId>] {
        &self.concept_ids
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn days(&self) -> &[i64] {
        &self.days
    }

    pub fn get(&self, index: usize) -> Option<DrugAdministration<'_>> {
        Some(DrugAdministration {
            concept_id: self.concept_ids.get(index)?.as_ref(),
            name: self.names.get(index)?,
            day: *self.days.get(index)?,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = DrugAdministration<'_>> + '_ {
        (0..self.len()).filter_map(|index| self.get(index))
    }

    /// Classifier input: one entry per administration event.
    pub fn entries(&self) -> Vec<DrugEntry> {
        self.records()
            .map(|record| {
                DrugEntry::new(record.concept_id.cloned(), Some(record.name.to_string()))
            })
            .collect()
    }

    /// Smallest and largest day index present, if any.
    pub fn day_span(&self) -> Option<(i64, i64)> {
        let min = self.days.iter().copied().min()?;
        let max = self.days.iter().copied().max()?;
        Some((min, max))
    }
}

/// Wire shape: `{drug_concept_id, drug_name, days}` parallel arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPatientDrugData {
    #[serde(deserialize_with = "deserialize_optional_ids")]
    drug_concept_id: Vec<Option<ConceptId>>,
    drug_name: Vec<String>,
    days: Vec<i64>,
}

impl TryFrom<RawPatientDrugData> for PatientDrugData {
    type Error = ModelError;

    fn try_from(raw: RawPatientDrugData) -> Result<Self> {
        Self::new(raw.drug_concept_id, raw.drug_name, raw.days)
    }
}

impl From<PatientDrugData> for RawPatientDrugData {
    fn from(data: PatientDrugData) -> Self {
        Self {
            drug_concept_id: data.concept_ids,
            drug_name: data.names,
            days: data.days,
        }
    }
}
