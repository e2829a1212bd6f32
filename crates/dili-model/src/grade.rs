use serde::{Deserialize, Serialize};

/// Hepatotoxicity grade recorded on a study day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GradePoint {
    pub day: i64,
    pub grade: i64,
}

impl GradePoint {
    pub fn new(day: i64, grade: i64) -> Self {
        Self { day, grade }
    }
}
