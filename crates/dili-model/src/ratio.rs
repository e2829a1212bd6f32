use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Distinct toxic and total drug counts for a day or a window of days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureRatio {
    pub toxic_count: usize,
    pub total_count: usize,
}

impl ExposureRatio {
    pub fn new(toxic_count: usize, total_count: usize) -> Self {
        Self {
            toxic_count,
            total_count,
        }
    }

    /// Toxic share of the total, `None` when nothing was administered.
    pub fn fraction(&self) -> Option<f64> {
        (self.total_count > 0).then(|| self.toxic_count as f64 / self.total_count as f64)
    }
}

impl std::ops::Add for ExposureRatio {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            toxic_count: self.toxic_count + other.toxic_count,
            total_count: self.total_count + other.total_count,
        }
    }
}

impl std::iter::Sum for ExposureRatio {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, ratio| acc + ratio)
    }
}

/// Normalized drug names seen on a single day, split by classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySets {
    pub toxic_names: BTreeSet<String>,
    pub safe_names: BTreeSet<String>,
}

impl DaySets {
    pub fn ratio(&self) -> ExposureRatio {
        let toxic = self.toxic_names.len();
        ExposureRatio::new(toxic, toxic + self.safe_names.len())
    }

    pub fn is_empty(&self) -> bool {
        self.toxic_names.is_empty() && self.safe_names.is_empty()
    }
}

/// Daily and trailing-window ratios for one day, as charted per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRatioRow {
    pub day: i64,
    pub daily: ExposureRatio,
    pub cumulative: ExposureRatio,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_none_without_exposure() {
        assert_eq!(ExposureRatio::default().fraction(), None);
        assert_eq!(ExposureRatio::new(1, 4).fraction(), Some(0.25));
    }

    #[test]
    fn ratios_sum_componentwise() {
        let total: ExposureRatio = [ExposureRatio::new(1, 2), ExposureRatio::new(0, 3)]
            .into_iter()
            .sum();
        assert_eq!(total, ExposureRatio::new(1, 5));
    }
}
