use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::aligner::aggregate::{aggregate_monthly, daily_rates};
use crate::aligner::error::AlignError;
use crate::aligner::types::{Column, MergedTable, MonthlyRecord};
use crate::dam::DamTable;
use crate::quantity::Quantity;
use crate::water::WaterTable;

/// Default output schema for a set of declared quantities: every quantity in
/// vocabulary order, then both dam rates, with chlorophyll-a moved last.
pub fn default_columns(quantities: &[Quantity]) -> Vec<Column> {
    let mut columns: Vec<Column> = quantities
        .iter()
        .filter(|q| **q != Quantity::ChlorophyllA)
        .map(|q| Column::Water(*q))
        .collect();
    columns.push(Column::DischargeRate);
    columns.push(Column::RainfallRate);
    if quantities.contains(&Quantity::ChlorophyllA) {
        columns.push(Column::Water(Quantity::ChlorophyllA));
    }
    columns
}

/// Aligns daily water readings with monthly dam totals using the default
/// schema for the quantities `water` declares.
///
/// Months present on only one side are dropped, as are months with any
/// missing value. Empty inputs give an empty table.
#[instrument(skip_all, fields(n_readings = water.len(), n_dam = dam.len()))]
pub fn align(water: &WaterTable, dam: &DamTable) -> MergedTable {
    merge(water, dam, default_columns(water.columns()))
}

/// Like [`align`], but the output holds exactly `selected`, in that order.
///
/// Rows are the same months [`align`] keeps: a month missing any declared
/// quantity or dam rate is dropped even when that column is not selected.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`AlignError::EmptySelection`] | `selected` is empty |
/// | [`AlignError::MissingColumn`] | A selected quantity is not declared by `water` |
/// | [`AlignError::DuplicateColumn`] | A column is selected twice |
#[instrument(skip_all, fields(n_readings = water.len(), n_dam = dam.len(), n_columns = selected.len()))]
pub fn align_subset(
    water: &WaterTable,
    dam: &DamTable,
    selected: &[Column],
) -> Result<MergedTable, AlignError> {
    if selected.is_empty() {
        return Err(AlignError::EmptySelection);
    }

    let mut seen = HashSet::new();
    for column in selected {
        if !seen.insert(*column) {
            return Err(AlignError::DuplicateColumn {
                column: column.name().to_string(),
            });
        }
        if let Column::Water(q) = column {
            if !water.has(*q) {
                return Err(AlignError::MissingColumn {
                    column: column.name().to_string(),
                });
            }
        }
    }

    Ok(merge(water, dam, selected.to_vec()))
}

/// Inner join of the monthly aggregate and the dam rates on month.
///
/// Completeness is judged over every aggregated quantity and both rates;
/// `columns` only picks what the surviving rows carry.
fn merge(water: &WaterTable, dam: &DamTable, columns: Vec<Column>) -> MergedTable {
    let monthly = aggregate_monthly(water);
    let rates = daily_rates(dam);

    let mut rows = Vec::new();
    let mut water_only = 0usize;
    let mut incomplete = 0usize;

    for month in monthly.months() {
        let Some(rate) = rates.get(&month) else {
            water_only += 1;
            continue;
        };

        let missing = if rate.discharge.is_none() {
            Some(Column::DischargeRate)
        } else if rate.rainfall.is_none() {
            Some(Column::RainfallRate)
        } else {
            monthly
                .columns()
                .iter()
                .copied()
                .find(|q| monthly.mean(month, *q).is_none())
                .map(Column::Water)
        };
        if let Some(column) = missing {
            debug!(month = %month, column = %column, "Dropping month with a missing value");
            incomplete += 1;
            continue;
        }

        let values: Option<Vec<f64>> = columns
            .iter()
            .map(|column| match column {
                Column::Water(q) => monthly.mean(month, *q),
                Column::DischargeRate => rate.discharge,
                Column::RainfallRate => rate.rainfall,
            })
            .collect();

        match values {
            Some(values) => rows.push(MonthlyRecord {
                date: month.first_day(),
                values,
            }),
            None => incomplete += 1,
        }
    }

    let dam_only = rates
        .keys()
        .filter(|m| !monthly.months().any(|w| w == **m))
        .count();

    debug!(
        water_months = monthly.len(),
        dam_months = rates.len(),
        rows = rows.len(),
        water_only,
        dam_only,
        incomplete,
        "Monthly alignment complete"
    );

    MergedTable { columns, rows }
}
