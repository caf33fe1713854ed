//! Piecewise-linear daily interpolation of periodic observations.
//!
//! A category's observations `(d_i, v_i)` become an ordered table of segments
//! keyed by their start date. Each segment stores the value at its start and a
//! constant per-day rate:
//!
//! ```text
//! rate_i   = (v_{i+1} - v_i) / (d_{i+1} - d_i)
//! value(t) = v_i + (t - d_i) * rate_i        for d_i <= t < d_{i+1}
//! ```
//!
//! The segment starting at the last observation reuses the final interval's
//! rate, which extrapolates the trend forward. There is no backward
//! extrapolation: dates before the first observation have no value.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::domain::CategorySeries;
use crate::error::{SeriesKind, UnitError};

/// Value and per-day rate from a segment's start date onward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub base: f64,
    pub rate: f64,
}

/// Ordered `{base, rate}` lookup for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationTable {
    category: String,
    segments: BTreeMap<NaiveDate, Segment>,
}

impl InterpolationTable {
    /// Build the segment table for a date-ordered series.
    pub fn build(series: &CategorySeries, kind: SeriesKind) -> Result<Self, UnitError> {
        let points = &series.points;
        if points.len() < 2 {
            return Err(UnitError::InsufficientData {
                series: kind,
                category: series.category.clone(),
                observed: points.len(),
            });
        }

        let mut segments = BTreeMap::new();
        let mut last_rate = 0.0;
        for pair in points.windows(2) {
            let (d0, v0) = pair[0];
            let (d1, v1) = pair[1];
            let days = (d1 - d0).num_days();
            if days <= 0 {
                return Err(UnitError::DuplicateObservation {
                    series: kind,
                    category: series.category.clone(),
                    date: d1,
                });
            }
            last_rate = (v1 - v0) / days as f64;
            segments.insert(d0, Segment { base: v0, rate: last_rate });
        }

        let (last_date, last_value) = points[points.len() - 1];
        segments.insert(
            last_date,
            Segment {
                base: last_value,
                rate: last_rate,
            },
        );

        Ok(Self {
            category: series.category.clone(),
            segments,
        })
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.segments.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.segments.keys().next_back().copied()
    }

    /// Interpolated (or forward-extrapolated) value on `date`.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let (start, seg) = self.segments.range(..=date).next_back()?;
        let offset = (date - *start).num_days() as f64;
        Some(seg.base + offset * seg.rate)
    }

    /// Materialize one value per day over `range`, clipped to start no earlier
    /// than the first observation.
    pub fn densify(&self, range: DateRange) -> DailySeries {
        let start = match self.first_date() {
            Some(first) if first > range.start => first,
            _ => range.start,
        };
        let values = DateRange {
            start,
            end: range.end,
        }
        .iter()
        .filter_map(|date| self.value_at(date))
        .collect();

        DailySeries {
            category: self.category.clone(),
            start,
            last_observed: self.last_date().unwrap_or(start),
            values,
        }
    }
}

/// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Smallest range covering every date yielded by `dates`.
    pub fn covering(dates: impl IntoIterator<Item = NaiveDate>) -> Option<Self> {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        let (start, end) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    /// Number of days in the range (0 when `start > end`).
    pub fn len_days(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let start = self.start;
        (0..self.len_days()).map(move |i| start + Duration::days(i as i64))
    }
}

/// One value per consecutive day, starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub category: String,
    pub start: NaiveDate,
    /// Last observed date; later values are extrapolated.
    pub last_observed: NaiveDate,
    pub values: Vec<f64>,
}

impl DailySeries {
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        let offset = usize::try_from((date - self.start).num_days()).ok()?;
        self.values.get(offset).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_extrapolated(&self, date: NaiveDate) -> bool {
        date > self.last_observed
    }
}
