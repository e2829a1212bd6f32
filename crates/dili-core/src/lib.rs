//! Hepatotoxic drug classification and exposure ratio engine.
//!
//! [`classifier`] partitions a patient's drugs into toxic and safe once;
//! [`ratio`] answers per-day and trailing-window questions against the
//! resulting lookup sets.

pub mod classifier;
pub mod ratio;
pub mod timeline;
pub mod worker;

pub use classifier::{
    ClassifierOptions, DEFAULT_INVALID_INGREDIENT_MARKERS, classify, classify_columns,
    classify_patient,
};
pub use ratio::{
    DEFAULT_WINDOW_DAYS, FIRST_DAY, RatioEngine, calculate_cumulative_7day_ratio,
    calculate_daily_ratio, classify_day_sets, window_days,
};
pub use timeline::{DrugTimeline, drug_timelines};
pub use worker::{ClassificationWorker, ClassifyRequest, ClassifyResponse, WorkerError};
