//! Column mapping and read options for exposure files.

use serde::{Deserialize, Serialize};

use crate::delimiter::Delimiter;

pub const DEFAULT_PATIENT_COLUMN: &str = "patient_no";
pub const DEFAULT_CONCEPT_ID_COLUMN: &str = "drug_concept_id";
pub const DEFAULT_NAME_COLUMN: &str = "drug_name";
pub const DEFAULT_DAY_COLUMN: &str = "day_num";
pub const DEFAULT_GRADE_COLUMN: &str = "grade";
pub const DEFAULT_INDEX_DATE_COLUMN: &str = "index_date";
pub const DEFAULT_EXPOSURE_DATE_COLUMN: &str = "new_drug_exposure_date";

/// Where a row's study day comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum DaySource {
    /// Integer column, optionally prefixed with `D` (e.g. `D12`).
    Column { name: String },
    /// Study day between two `YYYY-MM-DD` columns. Day 1 is the index date.
    Dates {
        index_date: String,
        event_date: String,
    },
}

impl Default for DaySource {
    fn default() -> Self {
        Self::Column {
            name: DEFAULT_DAY_COLUMN.to_string(),
        }
    }
}

impl DaySource {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column { name: name.into() }
    }

    pub fn dates() -> Self {
        Self::Dates {
            index_date: DEFAULT_INDEX_DATE_COLUMN.to_string(),
            event_date: DEFAULT_EXPOSURE_DATE_COLUMN.to_string(),
        }
    }

    /// Header names this source reads.
    pub fn required_columns(&self) -> Vec<&str> {
        match self {
            Self::Column { name } => vec![name.as_str()],
            Self::Dates {
                index_date,
                event_date,
            } => vec![index_date.as_str(), event_date.as_str()],
        }
    }
}

/// Header names of the columns an exposure file must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureColumns {
    pub patient: String,
    pub concept_id: String,
    pub name: String,
    pub day: DaySource,
    /// Hepatotoxicity grade, read only when the file has this column.
    pub grade: Option<String>,
}

impl Default for ExposureColumns {
    fn default() -> Self {
        Self {
            patient: DEFAULT_PATIENT_COLUMN.to_string(),
            concept_id: DEFAULT_CONCEPT_ID_COLUMN.to_string(),
            name: DEFAULT_NAME_COLUMN.to_string(),
            day: DaySource::default(),
            grade: Some(DEFAULT_GRADE_COLUMN.to_string()),
        }
    }
}

/// Options for [`ExposureStore::open`](crate::ExposureStore::open).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    pub columns: ExposureColumns,
    /// Skip detection and split on this delimiter.
    pub delimiter: Option<Delimiter>,
    /// Added to every parsed day, e.g. `1` for zero-based day columns.
    pub day_offset: i64,
}

impl IngestOptions {
    pub fn with_patient_column(mut self, name: impl Into<String>) -> Self {
        self.columns.patient = name.into();
        self
    }

    pub fn with_concept_id_column(mut self, name: impl Into<String>) -> Self {
        self.columns.concept_id = name.into();
        self
    }

    pub fn with_name_column(mut self, name: impl Into<String>) -> Self {
        self.columns.name = name.into();
        self
    }

    pub fn with_day_source(mut self, day: DaySource) -> Self {
        self.columns.day = day;
        self
    }

    pub fn with_grade_column(mut self, name: Option<String>) -> Self {
        self.columns.grade = name;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_day_offset(mut self, offset: i64) -> Self {
        self.day_offset = offset;
        self
    }
}
