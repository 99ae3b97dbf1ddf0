use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, warn};

use crate::aligner::types::{DamRates, Dated, MonthlyAggregate, YearMonth};
use crate::aligner::utility::mean;
use crate::dam::DamTable;
use crate::water::WaterTable;

/// Groups water readings by calendar month and averages every declared
/// quantity.
///
/// Each quantity's mean uses only the readings that carry it. Readings
/// without a date are skipped. Undeclared quantities are not aggregated.
pub fn aggregate_monthly(water: &WaterTable) -> MonthlyAggregate {
    let columns = water.columns().to_vec();
    let mut series: BTreeMap<YearMonth, Vec<Vec<f64>>> = BTreeMap::new();
    let mut undated = 0usize;

    for reading in water.readings() {
        let Some(date) = reading.date() else {
            undated += 1;
            continue;
        };

        let bucket = series
            .entry(YearMonth::from_date(date))
            .or_insert_with(|| vec![Vec::new(); columns.len()]);

        for (values, quantity) in bucket.iter_mut().zip(&columns) {
            if let Some(v) = reading.get(*quantity) {
                values.push(v);
            }
        }
    }

    if undated > 0 {
        debug!(undated, "Skipped water readings without a date");
    }

    let months = series
        .into_iter()
        .map(|(month, values)| (month, values.iter().map(|v| mean(v)).collect()))
        .collect();

    MonthlyAggregate { columns, months }
}

/// Converts each dam record's monthly totals into daily rates, keyed by month.
///
/// The divisor is the exact number of days in the record's month. When two
/// records fall in the same month the first one wins.
pub fn daily_rates(dam: &DamTable) -> BTreeMap<YearMonth, DamRates> {
    let mut rates = BTreeMap::new();
    let mut undated = 0usize;

    for record in dam.records() {
        let Some(date) = record.date() else {
            undated += 1;
            continue;
        };

        let month = YearMonth::from_date(date);
        let days = month.days_in_month();

        match rates.entry(month) {
            Entry::Vacant(slot) => {
                slot.insert(DamRates {
                    days_in_month: days,
                    discharge: record.discharge_total.map(|t| t / f64::from(days)),
                    rainfall: record.rainfall_total.map(|t| t / f64::from(days)),
                });
            }
            Entry::Occupied(_) => {
                warn!(month = %month, "Duplicate dam record for month, keeping the first");
            }
        }
    }

    if undated > 0 {
        debug!(undated, "Skipped dam records without a date");
    }

    rates
}
