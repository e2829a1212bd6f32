//! Exposure file ingestion.
//!
//! Loads tab, comma, or whitespace separated drug exposure exports into a
//! Polars-backed [`ExposureStore`] and reads the reference lists used by the
//! classifier.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use dili_ingest::{ExposureStore, IngestOptions, read_toxicity_reference};
//!
//! let store = ExposureStore::open(Path::new("sample_drug_data.txt"), &IngestOptions::default())?;
//! let reference = read_toxicity_reference(Path::new("hepatotoxic.csv"))?;
//! for patient in store.patient_ids() {
//!     let data = store.patient_drug_data(patient)?;
//! }
//! ```

mod delimiter;
mod error;
mod options;
mod reference;
mod store;

// === Error Types ===
pub use error::{IngestError, Result};

// === Delimiter Detection ===
pub use delimiter::{Delimiter, DelimiterGuess, detect_delimiter};

// === Exposure Files ===
pub use options::{
    DEFAULT_CONCEPT_ID_COLUMN, DEFAULT_DAY_COLUMN, DEFAULT_EXPOSURE_DATE_COLUMN,
    DEFAULT_GRADE_COLUMN, DEFAULT_INDEX_DATE_COLUMN, DEFAULT_NAME_COLUMN, DEFAULT_PATIENT_COLUMN,
    DaySource,
    ExposureColumns, IngestOptions,
};
pub use store::{ExposureStore, study_day};

// === Reference Lists ===
pub use reference::{NameList, read_name_list, read_toxicity_reference};
