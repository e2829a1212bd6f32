//! Error types for exposure file ingestion.

use std::path::PathBuf;

use thiserror::Error;

use dili_model::ModelError;

/// Errors that can occur while loading exposure data or reference lists.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// Too few non-empty lines to judge the file layout.
    #[error("file has {lines} non-empty line(s); at least 2 are needed to detect a delimiter")]
    InsufficientLines { lines: usize },

    /// No candidate delimiter scored high enough.
    #[error("could not detect a delimiter (best score {score:.2})")]
    UndetectedDelimiter { score: f64 },

    /// Failed to parse delimited text.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Failed to read a reference list.
    #[error("failed to read CSV {path}: {source}")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Required column not present in the header.
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // === Lookup Errors ===
    #[error("patient '{patient}' not found")]
    UnknownPatient { patient: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl IngestError {
    pub(crate) fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn data_frame(error: impl std::fmt::Display) -> Self {
        Self::DataFrame {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
