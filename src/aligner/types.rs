//! Data types used by the alignment pipeline.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::aligner::error::AlignError;
use crate::aligner::utility::days_in_month;
use crate::dam::DamRecord;
use crate::quantity::Quantity;
use crate::water::WaterReading;

/// The single accessor through which the aligner reads a row's date.
///
/// `None` means the source date was missing or unparseable; such rows cannot
/// be grouped and are skipped.
pub trait Dated {
    fn date(&self) -> Option<NaiveDate>;
}

impl Dated for WaterReading {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Dated for DamRecord {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// A calendar month, the grouping and join key. Stored as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// A value column of the merged table. The month itself is not a column; it
/// is carried by every [`MonthlyRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Monthly mean of a water-quality quantity.
    Water(Quantity),
    /// Monthly discharge total divided by the days in the month.
    DischargeRate,
    /// Monthly rainfall total divided by the days in the month.
    RainfallRate,
}

impl Column {
    /// Schema of the chlorophyll-a forecast model, target last.
    pub const CHLOROPHYLL_FEATURES: [Column; 8] = [
        Column::Water(Quantity::WaterTemp),
        Column::Water(Quantity::FlowRate),
        Column::Water(Quantity::Toc),
        Column::Water(Quantity::TotalPhosphorus),
        Column::Water(Quantity::SuspendedSolids),
        Column::DischargeRate,
        Column::RainfallRate,
        Column::Water(Quantity::ChlorophyllA),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Water(q) => q.name(),
            Column::DischargeRate => "dam_discharge_rate",
            Column::RainfallRate => "dam_rainfall_rate",
        }
    }

    /// Korean label, matching the naming of the source datasets.
    pub fn label(&self) -> &'static str {
        match self {
            Column::Water(q) => q.label(),
            Column::DischargeRate => "하굿둑방류량_평균",
            Column::RainfallRate => "하굿둑강수량_평균",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = AlignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for rate in [Column::DischargeRate, Column::RainfallRate] {
            if rate.name().eq_ignore_ascii_case(s) || rate.label() == s {
                return Ok(rate);
            }
        }
        s.parse::<Quantity>()
            .map(Column::Water)
            .map_err(|_| AlignError::UnknownColumn {
                name: s.to_string(),
            })
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Monthly means of the declared water-quality quantities.
///
/// A mean is `None` when no reading in that month carried the quantity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyAggregate {
    pub(crate) columns: Vec<Quantity>,
    pub(crate) months: BTreeMap<YearMonth, Vec<Option<f64>>>,
}

impl MonthlyAggregate {
    pub fn columns(&self) -> &[Quantity] {
        &self.columns
    }

    /// Months in ascending order.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.months.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn mean(&self, month: YearMonth, quantity: Quantity) -> Option<f64> {
        let idx = self.columns.iter().position(|q| *q == quantity)?;
        self.months.get(&month).and_then(|means| means[idx])
    }
}

/// Dam totals of one month converted to daily rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamRates {
    pub days_in_month: u32,
    pub discharge: Option<f64>,
    pub rainfall: Option<f64>,
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRecord {
    /// First day of the month.
    pub date: NaiveDate,
    /// Values parallel to [`MergedTable::columns`]. Never missing.
    pub values: Vec<f64>,
}

/// The aligned feature table: one complete row per month, ascending.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MergedTable {
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<MonthlyRecord>,
}

impl MergedTable {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[MonthlyRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// Value of `column` in the row for the month containing `date`.
    pub fn value(&self, date: NaiveDate, column: Column) -> Option<f64> {
        let idx = self.column_index(column)?;
        let first = YearMonth::from_date(date).first_day();
        self.rows
            .iter()
            .find(|r| r.date == first)
            .map(|r| r.values[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_from_date() {
        let ym = YearMonth::from_date(NaiveDate::from_ymd_opt(2023, 3, 17).unwrap());
        assert_eq!(ym, YearMonth::new(2023, 3).unwrap());
        assert_eq!(ym.first_day(), NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(ym.to_string(), "2023-03");
    }

    #[test]
    fn test_year_month_ordering() {
        let dec = YearMonth::new(2022, 12).unwrap();
        let jan = YearMonth::new(2023, 1).unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn test_year_month_days() {
        assert_eq!(YearMonth::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(YearMonth::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(YearMonth::new(2023, 7).unwrap().days_in_month(), 31);
        assert!(YearMonth::new(2023, 13).is_none());
    }

    #[test]
    fn test_column_parse() {
        assert_eq!("dam_discharge_rate".parse::<Column>(), Ok(Column::DischargeRate));
        assert_eq!("하굿둑강수량_평균".parse::<Column>(), Ok(Column::RainfallRate));
        assert_eq!(
            "유량".parse::<Column>(),
            Ok(Column::Water(Quantity::FlowRate))
        );
        assert_eq!(
            "salinity".parse::<Column>(),
            Err(AlignError::UnknownColumn {
                name: "salinity".to_string()
            })
        );
    }

    #[test]
    fn test_chlorophyll_features_end_with_target() {
        assert_eq!(
            Column::CHLOROPHYLL_FEATURES.last(),
            Some(&Column::Water(Quantity::ChlorophyllA))
        );
    }

    #[test]
    fn test_merged_table_serializes_column_names() {
        let table = MergedTable {
            columns: vec![Column::Water(Quantity::WaterTemp), Column::DischargeRate],
            rows: vec![MonthlyRecord {
                date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                values: vec![4.5, 1.0],
            }],
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["columns"][0], "water_temp");
        assert_eq!(json["columns"][1], "dam_discharge_rate");
        assert_eq!(json["rows"][0]["date"], "2023-01-01");
        assert_eq!(json["rows"][0]["values"][1], 1.0);
    }
}
