//! Monthly estuary-barrage discharge and rainfall totals.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::io::Read;
use tracing::{debug, warn};

use crate::parser::{parse_date, parse_number, value_as_date, value_as_number};

pub const DAM_API_URL: &str =
    "https://api.odcloud.kr/api/15143064/v1/uddi:62b4a7c0-558f-4117-baec-f75e3e95b1e3";

/// Raw field names of the dam service.
pub const DATE_FIELD: &str = "날짜";
pub const DISCHARGE_FIELD: &str = "방류량(백만톤)";
pub const RAINFALL_FIELD: &str = "강수량(밀리미터)";

/// Normalized labels used by exported datasets.
pub const DATE_LABEL: &str = "일자";
pub const DISCHARGE_LABEL: &str = "하굿둑방류량";
pub const RAINFALL_LABEL: &str = "하굿둑강수량";

pub const DISCHARGE_COLUMN: &str = "discharge_total";
pub const RAINFALL_COLUMN: &str = "rainfall_total";

/// Paging parameters for the single page we fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct DamQuery {
    pub page: u32,
    pub per_page: u32,
}

impl Default for DamQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 2000,
        }
    }
}

impl DamQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("perPage", self.per_page.to_string()),
            ("returnType", "JSON".to_string()),
        ]
    }
}

/// One month of barrage figures.
#[derive(Debug, Clone, PartialEq)]
pub struct DamRecord {
    /// Any date inside the month the totals belong to.
    pub date: Option<NaiveDate>,
    /// Discharge over the month, million tons.
    pub discharge_total: Option<f64>,
    /// Rainfall over the month, millimeters.
    pub rainfall_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DamTable {
    records: Vec<DamRecord>,
}

impl DamTable {
    pub fn new(records: Vec<DamRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: DamRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DamRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Builds a table from the JSON body of the dam service
    /// (`{"data": [...], "matchCount": n}`).
    pub fn from_api_body(body: &[u8]) -> Result<Self> {
        let json: Value =
            serde_json::from_slice(body).context("dam response is not valid JSON")?;

        let items: &[Value] = match json.get("data") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };

        if items.is_empty() {
            let match_count = json.get("matchCount").and_then(Value::as_u64).unwrap_or(0);
            warn!(match_count, "Dam response succeeded but carried no data");
            return Ok(Self::default());
        }

        let records: Vec<DamRecord> = items
            .iter()
            .map(|item| DamRecord {
                date: item.get(DATE_FIELD).and_then(value_as_date),
                discharge_total: item.get(DISCHARGE_FIELD).and_then(value_as_number),
                rainfall_total: item.get(RAINFALL_FIELD).and_then(value_as_number),
            })
            .collect();

        debug!(rows = records.len(), "Dam records normalized");
        Ok(Self::new(records))
    }

    /// Loads a UTF-8 CSV with a date column and the two totals. Raw service
    /// names, normalized labels and export column names are all accepted.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers().context("reading CSV header")?.clone();

        let date_col = column_position(&headers, &[DATE_FIELD, DATE_LABEL, "date"])
            .context("CSV has no date column (날짜, 일자 or date)")?;
        let discharge_col =
            column_position(&headers, &[DISCHARGE_FIELD, DISCHARGE_LABEL, DISCHARGE_COLUMN])
                .context("CSV has no discharge column")?;
        let rainfall_col =
            column_position(&headers, &[RAINFALL_FIELD, RAINFALL_LABEL, RAINFALL_COLUMN])
                .context("CSV has no rainfall column")?;

        let mut table = Self::default();
        for (row, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("reading CSV row {}", row + 1))?;
            let cell = |i: usize| record.get(i).unwrap_or("");
            table.push(DamRecord {
                date: parse_date(cell(date_col)),
                discharge_total: parse_number(cell(discharge_col)),
                rainfall_total: parse_number(cell(rainfall_col)),
            });
        }

        Ok(table)
    }
}

fn column_position(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().trim_start_matches('\u{feff}');
        names.iter().any(|n| h.eq_ignore_ascii_case(n))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_query_params() {
        let params = DamQuery::default().to_params();
        assert_eq!(
            params,
            vec![
                ("page", "1".to_string()),
                ("perPage", "2000".to_string()),
                ("returnType", "JSON".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_api_body() {
        let body = r#"{
            "currentCount": 3,
            "matchCount": 3,
            "data": [
                {"날짜": "2024-02", "방류량(백만톤)": "290.0", "강수량(밀리미터)": 58},
                {"날짜": "2024-03-01", "방류량(백만톤)": 310.5, "강수량(밀리미터)": "-"},
                {"날짜": "", "방류량(백만톤)": 1.0, "강수량(밀리미터)": 1.0}
            ]
        }"#;

        let table = DamTable::from_api_body(body.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let feb = &table.records()[0];
        assert_eq!(feb.date, Some(ymd(2024, 2, 1)));
        assert_eq!(feb.discharge_total, Some(290.0));
        assert_eq!(feb.rainfall_total, Some(58.0));

        let mar = &table.records()[1];
        assert_eq!(mar.discharge_total, Some(310.5));
        assert_eq!(mar.rainfall_total, None);

        assert_eq!(table.records()[2].date, None);
    }

    #[test]
    fn test_from_api_body_empty_data() {
        let table = DamTable::from_api_body(br#"{"data": [], "matchCount": 0}"#).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_from_csv_reader_accepts_labels() {
        let csv = "일자,하굿둑방류량,하굿둑강수량\n2023-01-01,31.0,62\n2023-02-01,,10\n";
        let table = DamTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].discharge_total, Some(31.0));
        assert_eq!(table.records()[1].discharge_total, None);
        assert_eq!(table.records()[1].rainfall_total, Some(10.0));
    }

    #[test]
    fn test_from_csv_reader_accepts_export_columns() {
        let csv = "date,discharge_total,rainfall_total\n2023-01-01,31.0,62\n";
        let table = DamTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.records()[0].date, Some(ymd(2023, 1, 1)));
    }

    #[test]
    fn test_from_csv_reader_missing_column() {
        let csv = "date,discharge_total\n2023-01-01,31.0\n";
        assert!(DamTable::from_csv_reader(csv.as_bytes()).is_err());
    }
}
