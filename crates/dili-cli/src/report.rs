//! Serializable command results.

use std::collections::BTreeSet;

use serde::Serialize;

use dili_core::{FIRST_DAY, RatioEngine};
use dili_ingest::{ExposureStore, IngestError};
use dili_model::{DayRatioRow, ExposureRatio, PatientDrugData, ReferenceSets, usable_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub patient: String,
    pub rows: usize,
    pub distinct_drugs: usize,
    pub first_day: Option<i64>,
    pub last_day: Option<i64>,
}

impl PatientSummary {
    pub fn from_data(patient: impl Into<String>, data: &PatientDrugData) -> Self {
        let drugs: BTreeSet<String> = data
            .names()
            .iter()
            .filter_map(|name| usable_name(name))
            .collect();
        let span = data.day_span();
        Self {
            patient: patient.into(),
            rows: data.len(),
            distinct_drugs: drugs.len(),
            first_day: span.map(|(first, _)| first),
            last_day: span.map(|(_, last)| last),
        }
    }
}

/// One summary per patient, in file order.
pub fn patient_summaries(store: &ExposureStore) -> Result<Vec<PatientSummary>, IngestError> {
    store
        .patient_ids()
        .iter()
        .map(|patient| {
            let data = store.patient_drug_data(patient)?;
            Ok(PatientSummary::from_data(patient.as_str(), &data))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioReport {
    pub patient: String,
    pub window_days: i64,
    pub rows: Vec<DayRatioRow>,
}

/// Days to report: explicit bounds win, otherwise the exposure span.
/// Starts no earlier than day 1. `None` when the range is empty.
pub fn report_range(
    span: Option<(i64, i64)>,
    from: Option<i64>,
    to: Option<i64>,
) -> Option<(i64, i64)> {
    let first = from.or(span.map(|(first, _)| first))?.max(FIRST_DAY);
    let last = to.or(span.map(|(_, last)| last))?;
    (first <= last).then_some((first, last))
}

pub fn ratio_report(
    patient: &str,
    data: &PatientDrugData,
    sets: &ReferenceSets,
    from: Option<i64>,
    to: Option<i64>,
    window: i64,
) -> RatioReport {
    let engine = RatioEngine::new(data, sets);
    let rows = report_range(engine.day_span(), from, to)
        .map(|(first, last)| engine.series(first, last, window))
        .unwrap_or_default();
    RatioReport {
        patient: patient.to_string(),
        window_days: window,
        rows,
    }
}

/// `toxic/total (pct%)`, or `0/0 (-)` when nothing was given.
pub fn format_ratio(ratio: ExposureRatio) -> String {
    match ratio.fraction() {
        Some(fraction) => format!(
            "{}/{} ({:.1}%)",
            ratio.toxic_count,
            ratio.total_count,
            fraction * 100.0
        ),
        None => format!("{}/{} (-)", ratio.toxic_count, ratio.total_count),
    }
}
