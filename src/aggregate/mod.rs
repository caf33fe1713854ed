//! Category aggregation: per-category components → one row per date.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::compose::ReferencePopulation;
use crate::domain::{AsmComponent, DailyAggregate};

/// Sum components per date.
///
/// Raw deaths and raw population include every joined row. ASM only includes
/// rows with a valid contribution. ASMR always divides by the full reference
/// total, whatever the per-day coverage.
///
/// Dates where no category has a valid contribution are left out: there is no
/// ASM to report for them.
pub fn aggregate_daily(components: &[AsmComponent], reference: &ReferencePopulation) -> Vec<DailyAggregate> {
    let total = reference.total();
    let mut by_date: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();

    for c in components {
        let row = by_date.entry(c.date).or_insert(DailyAggregate {
            date: c.date,
            raw_deaths: 0.0,
            raw_population: 0.0,
            asm: 0.0,
            asmr: 0.0,
            categories: 0,
        });
        row.raw_deaths += c.deaths;
        row.raw_population += c.population;
        if let Some(contribution) = c.asm_contribution {
            row.asm += contribution;
            row.categories += 1;
        }
    }

    by_date
        .into_values()
        .filter(|row| row.categories > 0)
        .map(|row| DailyAggregate {
            asmr: row.asm / total,
            ..row
        })
        .collect()
}

/// Read-only ASM lookup by date, shared by every regression.
#[derive(Debug, Clone, Default)]
pub struct AsmSeries {
    values: BTreeMap<NaiveDate, f64>,
}

impl AsmSeries {
    pub fn from_aggregates(rows: &[DailyAggregate]) -> Self {
        Self {
            values: rows.iter().map(|r| (r.date, r.asm)).collect(),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.values.get(&date).copied()
    }
}

impl FromIterator<(NaiveDate, f64)> for AsmSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
