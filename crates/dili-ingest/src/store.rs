//! Patient-grouped exposure rows backed by a Polars DataFrame.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{debug, info, warn};

use dili_model::{ConceptId, DrugEntry, GradePoint, PatientDrugData};

use crate::delimiter::{Delimiter, detect_delimiter};
use crate::error::{IngestError, Result};
use crate::options::{DaySource, IngestOptions};

#[derive(Debug, Clone)]
struct ExposureRow {
    concept_id: Option<ConceptId>,
    name: String,
    day: i64,
    grade: Option<i64>,
}

/// Drug administrations loaded from one export, queryable per patient.
#[derive(Debug, Clone)]
pub struct ExposureStore {
    source: Option<PathBuf>,
    delimiter: Option<Delimiter>,
    frame: DataFrame,
    rows: Vec<ExposureRow>,
    /// Patient ids in first-seen order.
    patients: Vec<String>,
    rows_by_patient: BTreeMap<String, Vec<usize>>,
    skipped_rows: usize,
}

impl ExposureStore {
    /// Reads a delimited exposure file. Every column is read as text.
    pub fn open(path: &Path, options: &IngestOptions) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| IngestError::file_read(path, e))?;
        let delimiter = match options.delimiter {
            Some(delimiter) => delimiter,
            None => {
                let file_name = path.file_name().and_then(|name| name.to_str());
                let guess = detect_delimiter(&content, file_name)?;
                debug!(
                    path = %path.display(),
                    delimiter = guess.delimiter.label(),
                    confidence = guess.confidence,
                    "detected delimiter"
                );
                guess.delimiter
            }
        };

        let bytes = match delimiter {
            Delimiter::Whitespace => collapse_whitespace(&content).into_bytes(),
            Delimiter::Tab | Delimiter::Comma => content.into_bytes(),
        };
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|parse| parse.with_separator(delimiter.byte()))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| IngestError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut store = Self::from_frame(frame, options)?;
        store.source = Some(path.to_path_buf());
        store.delimiter = Some(delimiter);
        info!(
            path = %path.display(),
            rows = store.row_count(),
            patients = store.patients.len(),
            skipped = store.skipped_rows,
            "loaded exposure file"
        );
        Ok(store)
    }

    /// Builds a store from an in-memory frame. Non-text columns are cast to text.
    pub fn from_frame(frame: DataFrame, options: &IngestOptions) -> Result<Self> {
        let columns = &options.columns;
        let patients = text_column(&frame, &columns.patient)?;
        let concept_ids = text_column(&frame, &columns.concept_id)?;
        let names = text_column(&frame, &columns.name)?;
        let days = day_column(&frame, &columns.day)?;
        let grades: Vec<Option<i64>> = match columns.grade.as_deref() {
            Some(name) if frame.column(name).is_ok() => {
                text_column(&frame, name)?
                    .iter()
                    .map(|value| value.as_deref().and_then(parse_integer))
                    .collect()
            }
            _ => vec![None; patients.len()],
        };

        let mut store = Self {
            source: None,
            delimiter: None,
            frame,
            rows: Vec::with_capacity(patients.len()),
            patients: Vec::new(),
            rows_by_patient: BTreeMap::new(),
            skipped_rows: 0,
        };

        for (index, ((((patient, concept_id), name), day), grade)) in patients
            .into_iter()
            .zip(concept_ids)
            .zip(names)
            .zip(days)
            .zip(grades)
            .enumerate()
        {
            let patient = patient.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
            let day = day.and_then(|day| day.checked_add(options.day_offset));
            let (Some(patient), Some(day)) = (patient, day) else {
                debug!(row = index, "skipping row without patient or day");
                store.skipped_rows += 1;
                continue;
            };
            let row = ExposureRow {
                concept_id: concept_id.as_deref().and_then(ConceptId::parse_optional),
                name: name.unwrap_or_default(),
                day,
                grade,
            };
            let row_index = store.rows.len();
            store.rows.push(row);
            match store.rows_by_patient.get_mut(&patient) {
                Some(indices) => indices.push(row_index),
                None => {
                    store.patients.push(patient.clone());
                    store.rows_by_patient.insert(patient, vec![row_index]);
                }
            }
        }

        if store.skipped_rows > 0 {
            warn!(
                skipped = store.skipped_rows,
                "rows without a patient id or usable day were skipped"
            );
        }
        Ok(store)
    }

    /// Patient ids in the order they first appear.
    pub fn patient_ids(&self) -> &[String] {
        &self.patients
    }

    pub fn contains_patient(&self, patient: &str) -> bool {
        self.rows_by_patient.contains_key(patient)
    }

    /// Parallel per-administration arrays for one patient, in file order.
    pub fn patient_drug_data(&self, patient: &str) -> Result<PatientDrugData> {
        let rows = self.patient_rows(patient)?;
        Ok(PatientDrugData::from_rows(rows.map(|row| {
            (row.concept_id.clone(), row.name.clone(), row.day)
        })))
    }

    /// Graded rows for one patient, ordered by day.
    pub fn patient_grades(&self, patient: &str) -> Result<Vec<GradePoint>> {
        let mut grades: Vec<GradePoint> = self
            .patient_rows(patient)?
            .filter_map(|row| Some(GradePoint::new(row.day, row.grade?)))
            .collect();
        grades.sort_by_key(|point| point.day);
        Ok(grades)
    }

    /// Classifier input for one patient.
    pub fn drug_entries(&self, patient: &str) -> Result<Vec<DrugEntry>> {
        Ok(self.patient_rows(patient)?.map(to_entry).collect())
    }

    /// Classifier input for every loaded row.
    pub fn all_drug_entries(&self) -> Vec<DrugEntry> {
        self.rows.iter().map(to_entry).collect()
    }

    /// Rows kept after skipping incomplete ones.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn delimiter(&self) -> Option<Delimiter> {
        self.delimiter
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The frame as read, including columns the store does not use.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Releases the store and hands back the underlying frame.
    pub fn close(self) -> DataFrame {
        debug!(rows = self.rows.len(), "closing exposure store");
        self.frame
    }

    fn patient_rows(&self, patient: &str) -> Result<impl Iterator<Item = &ExposureRow> + '_> {
        let indices = self
            .rows_by_patient
            .get(patient)
            .ok_or_else(|| IngestError::UnknownPatient {
                patient: patient.to_string(),
            })?;
        Ok(indices.iter().map(|&index| &self.rows[index]))
    }
}

fn to_entry(row: &ExposureRow) -> DrugEntry {
    let name = Some(row.name.clone()).filter(|name| !name.trim().is_empty());
    DrugEntry::new(row.concept_id.clone(), name)
}

fn text_column(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = frame.column(name).map_err(|_| IngestError::MissingColumn {
        column: name.to_string(),
    })?;
    let column = column
        .cast(&DataType::String)
        .map_err(IngestError::data_frame)?;
    let values = column
        .str()
        .map_err(IngestError::data_frame)?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn day_column(frame: &DataFrame, source: &DaySource) -> Result<Vec<Option<i64>>> {
    match source {
        DaySource::Column { name } => Ok(text_column(frame, name)?
            .iter()
            .map(|value| value.as_deref().and_then(parse_day))
            .collect()),
        DaySource::Dates {
            index_date,
            event_date,
        } => {
            let index_dates = text_column(frame, index_date)?;
            let event_dates = text_column(frame, event_date)?;
            Ok(index_dates
                .iter()
                .zip(&event_dates)
                .map(|(index, event)| {
                    let index = parse_date(index.as_deref()?)?;
                    let event = parse_date(event.as_deref()?)?;
                    Some(study_day(event, index))
                })
                .collect())
        }
    }
}

/// Parses `12`, `D12`, or an integral float such as `12.0`.
pub(crate) fn parse_day(value: &str) -> Option<i64> {
    let value = value.trim();
    parse_integer(value.strip_prefix(['D', 'd']).unwrap_or(value))
}

fn parse_integer(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(day) = value.parse::<i64>() {
        return Some(day);
    }
    let float = value.parse::<f64>().ok()?;
    let in_range = (i64::MIN as f64..i64::MAX as f64).contains(&float);
    (float.fract() == 0.0 && in_range).then_some(float as i64)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Day 1 is the index date; the day before it is -1 (no day 0).
pub fn study_day(event_date: NaiveDate, index_date: NaiveDate) -> i64 {
    let days = (event_date - index_date).num_days();
    if days >= 0 { days + 1 } else { days }
}

fn collapse_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for line in content.lines() {
        out.push_str(&line.split_whitespace().collect::<Vec<_>>().join("\t"));
        out.push('\n');
    }
    out
}
