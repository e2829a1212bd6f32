//! Daily and trailing-window exposure ratios.
//!
//! Within a day, drugs are counted once per normalized name no matter how
//! many administrations were recorded. Across a window, per-day counts are
//! summed, so a drug given on three days of the window contributes three
//! exposure-days.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use dili_model::{DayRatioRow, DaySets, ExposureRatio, PatientDrugData, ReferenceSets, usable_name};

/// Length of the trailing cumulative window, today included.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// First day index of the time axis; windows never extend below it.
pub const FIRST_DAY: i64 = 1;

/// Days covered by a trailing window ending at `day`.
///
/// Clamped at day 1. Empty when `day` itself is below day 1.
pub fn window_days(day: i64, window_days: i64) -> RangeInclusive<i64> {
    let span = window_days.max(1) - 1;
    FIRST_DAY.max(day.saturating_sub(span))..=day
}

/// Ratio queries over one patient's administrations.
///
/// Holds only shared borrows and a per-day row index, so a single engine
/// can serve any number of concurrent readers.
#[derive(Debug, Clone)]
pub struct RatioEngine<'a> {
    data: &'a PatientDrugData,
    reference: &'a ReferenceSets,
    rows_by_day: BTreeMap<i64, Vec<usize>>,
}

impl<'a> RatioEngine<'a> {
    pub fn new(data: &'a PatientDrugData, reference: &'a ReferenceSets) -> Self {
        let mut rows_by_day: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (row, day) in data.days().iter().enumerate() {
            rows_by_day.entry(*day).or_default().push(row);
        }
        Self {
            data,
            reference,
            rows_by_day,
        }
    }

    /// Distinct toxic and safe names administered on `day`.
    pub fn day_sets(&self, day: i64) -> DaySets {
        let mut sets = DaySets::default();
        let Some(rows) = self.rows_by_day.get(&day) else {
            return sets;
        };
        let has_safe = self.reference.has_safe();
        for &row in rows {
            let Some(record) = self.data.get(row) else {
                continue;
            };
            if self.reference.is_excluded(record.concept_id) {
                continue;
            }
            let Some(name) = usable_name(record.name) else {
                continue;
            };
            if self.reference.is_toxic(record.concept_id, &name) {
                sets.toxic_names.insert(name);
            } else if !has_safe || self.reference.is_listed_safe(record.concept_id, &name) {
                sets.safe_names.insert(name);
            }
        }
        // a name toxic through any of its rows is not also counted as safe
        let DaySets {
            toxic_names,
            safe_names,
        } = &mut sets;
        safe_names.retain(|name| !toxic_names.contains(name));
        sets
    }

    pub fn daily_ratio(&self, day: i64) -> ExposureRatio {
        self.day_sets(day).ratio()
    }

    /// Sum of daily ratios over the trailing window ending at `day`.
    pub fn cumulative_ratio(&self, day: i64, window: i64) -> ExposureRatio {
        window_days(day, window).map(|d| self.daily_ratio(d)).sum()
    }

    pub fn cumulative_7day_ratio(&self, day: i64) -> ExposureRatio {
        self.cumulative_ratio(day, DEFAULT_WINDOW_DAYS)
    }

    /// One row per day in `first..=last`, daily ratios computed once each.
    pub fn series(&self, first: i64, last: i64, window: i64) -> Vec<DayRatioRow> {
        if first > last {
            return Vec::new();
        }
        let lead = *window_days(first, window).start();
        let daily: BTreeMap<i64, ExposureRatio> = (lead.min(first)..=last)
            .map(|day| (day, self.daily_ratio(day)))
            .collect();
        (first..=last)
            .map(|day| DayRatioRow {
                day,
                daily: daily.get(&day).copied().unwrap_or_default(),
                cumulative: window_days(day, window)
                    .filter_map(|d| daily.get(&d).copied())
                    .sum(),
            })
            .collect()
    }

    /// Smallest and largest day index with any administration.
    pub fn day_span(&self) -> Option<(i64, i64)> {
        let first = *self.rows_by_day.keys().next()?;
        let last = *self.rows_by_day.keys().next_back()?;
        Some((first, last))
    }
}

/// One-shot form of [`RatioEngine::day_sets`].
pub fn classify_day_sets(day: i64, data: &PatientDrugData, reference: &ReferenceSets) -> DaySets {
    RatioEngine::new(data, reference).day_sets(day)
}

/// One-shot form of [`RatioEngine::daily_ratio`].
pub fn calculate_daily_ratio(
    day: i64,
    data: &PatientDrugData,
    reference: &ReferenceSets,
) -> ExposureRatio {
    RatioEngine::new(data, reference).daily_ratio(day)
}

/// One-shot form of [`RatioEngine::cumulative_7day_ratio`].
pub fn calculate_cumulative_7day_ratio(
    day: i64,
    data: &PatientDrugData,
    reference: &ReferenceSets,
) -> ExposureRatio {
    RatioEngine::new(data, reference).cumulative_7day_ratio(day)
}
