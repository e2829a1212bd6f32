//! Per-drug exposure windows on the day axis.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use dili_model::{PatientDrugData, usable_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugTimeline {
    pub start_day: i64,
    pub end_day: i64,
    /// Distinct days with at least one administration.
    pub exposure_days: usize,
}

/// Exposure window for every usable drug name, keyed by normalized name.
pub fn drug_timelines(data: &PatientDrugData) -> BTreeMap<String, DrugTimeline> {
    let mut days_by_name: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
    for record in data.records() {
        if let Some(name) = usable_name(record.name) {
            days_by_name.entry(name).or_default().insert(record.day);
        }
    }
    days_by_name
        .into_iter()
        .filter_map(|(name, days)| {
            let start_day = *days.first()?;
            let end_day = *days.last()?;
            Some((
                name,
                DrugTimeline {
                    start_day,
                    end_day,
                    exposure_days: days.len(),
                },
            ))
        })
        .collect()
}
