pub mod classification;
pub mod error;
pub mod exposure;
pub mod grade;
pub mod ids;
pub mod name;
pub mod ratio;
pub mod reference;

pub use classification::ClassificationResult;
pub use error::{ModelError, Result};
pub use exposure::{DrugAdministration, DrugEntry, PatientDrugData};
pub use grade::GradePoint;
pub use ids::{ConceptId, RawConceptId};
pub use name::{UNKNOWN_NAME, is_usable_name, normalize_name, usable_name};
pub use ratio::{DayRatioRow, DaySets, ExposureRatio};
pub use reference::{
    DEFAULT_ICI_CONCEPT_IDS, DEFAULT_ICI_NAMES, IciAllowList, ReferenceSets, ToxicityReference,
};
