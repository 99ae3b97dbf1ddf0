//! Water-quality readings and the adapter that normalizes them.
//!
//! The measuring service speaks its own field vocabulary (`ITEM_TEMP`,
//! `WMCYMD`, ...). [`RENAME_MAP`] is the only place that vocabulary appears;
//! everything downstream works with [`Quantity`].

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::io::Read;
use tracing::{debug, warn};

use crate::parser::{parse_date, parse_number, value_as_date, value_as_number, value_as_text};
use crate::quantity::Quantity;

pub const WATER_API_URL: &str =
    "https://apis.data.go.kr/1480523/WaterQualityService/getWaterMeasuringList";

/// API field holding the station name.
pub const STATION_FIELD: &str = "PT_NM";
/// API field holding the measurement date.
pub const DATE_FIELD: &str = "WMCYMD";

pub const STATION_LABEL: &str = "총량지점명";
pub const DATE_LABEL: &str = "일자";

/// Raw API field name to quantity.
pub static RENAME_MAP: &[(&str, Quantity)] = &[
    ("ITEM_TEMP", Quantity::WaterTemp),
    ("ITEM_PH", Quantity::Ph),
    ("ITEM_EC", Quantity::Conductivity),
    ("ITEM_DOC", Quantity::DissolvedOxygen),
    ("ITEM_BOD", Quantity::Bod),
    ("ITEM_COD", Quantity::Cod),
    ("ITEM_SS", Quantity::SuspendedSolids),
    ("ITEM_TN", Quantity::TotalNitrogen),
    ("ITEM_TP", Quantity::TotalPhosphorus),
    ("ITEM_TOC", Quantity::Toc),
    ("ITEM_AMNT", Quantity::FlowRate),
    ("ITEM_CLOA", Quantity::ChlorophyllA),
];

/// Query parameters for a single page of the measuring list.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterQuery {
    pub stations: Vec<String>,
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub page_no: u32,
    pub num_of_rows: u32,
}

impl Default for WaterQuery {
    fn default() -> Self {
        Self {
            stations: vec!["2022A30".to_string(), "2022A10".to_string()],
            years: (2021..=2025).collect(),
            months: (1..=12).collect(),
            page_no: 1,
            num_of_rows: 3000,
        }
    }
}

impl WaterQuery {
    /// Query pairs in the order the service documents them. The service key
    /// is added by the HTTP layer.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pageNo", self.page_no.to_string()),
            ("numOfRows", self.num_of_rows.to_string()),
            ("resultType", "json".to_string()),
            ("ptNoList", self.stations.join(",")),
            (
                "wmyrList",
                self.years
                    .iter()
                    .map(|y| y.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            (
                "wmodList",
                self.months
                    .iter()
                    .map(|m| format!("{m:02}"))
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        ]
    }
}

/// One station-date observation.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterReading {
    pub station: Option<String>,
    pub date: Option<NaiveDate>,
    values: [Option<f64>; Quantity::COUNT],
}

impl WaterReading {
    pub fn new(station: Option<String>, date: Option<NaiveDate>) -> Self {
        Self {
            station,
            date,
            values: [None; Quantity::COUNT],
        }
    }

    /// Sets one quantity, builder style.
    pub fn with(mut self, quantity: Quantity, value: Option<f64>) -> Self {
        self.set(quantity, value);
        self
    }

    pub fn set(&mut self, quantity: Quantity, value: Option<f64>) {
        self.values[quantity.index()] = value;
    }

    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        self.values[quantity.index()]
    }
}

/// A water-quality table: the declared quantity columns plus the readings.
///
/// A quantity that is not declared is treated as absent from the dataset,
/// even if individual readings happen to carry a value for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaterTable {
    columns: Vec<Quantity>,
    readings: Vec<WaterReading>,
}

impl WaterTable {
    /// Creates an empty table. Columns are deduplicated and kept in
    /// canonical order.
    pub fn new(columns: impl IntoIterator<Item = Quantity>) -> Self {
        let mut columns: Vec<Quantity> = columns.into_iter().collect();
        columns.sort();
        columns.dedup();
        Self {
            columns,
            readings: Vec::new(),
        }
    }

    /// An empty table declaring the full vocabulary, as returned by the
    /// adapter when a fetch fails.
    pub fn with_all_quantities() -> Self {
        Self::new(Quantity::ALL)
    }

    pub fn push(&mut self, reading: WaterReading) {
        self.readings.push(reading);
    }

    pub fn columns(&self) -> &[Quantity] {
        &self.columns
    }

    pub fn has(&self, quantity: Quantity) -> bool {
        self.columns.contains(&quantity)
    }

    pub fn readings(&self) -> &[WaterReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Builds a table from the JSON body returned by the measuring service.
    ///
    /// Returns an empty table with the full schema when the body has no
    /// items. Fields are renamed through [`RENAME_MAP`]; unparseable numbers
    /// and dates become `None`.
    pub fn from_api_body(body: &[u8]) -> Result<Self> {
        let json: Value =
            serde_json::from_slice(body).context("water-quality response is not valid JSON")?;
        let items = api_items(&json);

        let mut table = Self::with_all_quantities();
        if items.is_empty() {
            warn!("Water-quality response succeeded but carried no items");
            return Ok(table);
        }

        for item in items {
            table.push(reading_from_item(item));
        }

        let undated = table.readings.iter().filter(|r| r.date.is_none()).count();
        debug!(rows = table.len(), undated, "Water-quality items normalized");
        Ok(table)
    }

    /// Loads a UTF-8 CSV export.
    ///
    /// Headers are matched against the Korean labels or the column names
    /// (`일자`/`date`, `총량지점명`/`station`, `수온`/`water_temp`, ...). Only the
    /// quantities found in the header are declared; other columns are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers().context("reading CSV header")?.clone();

        let mut date_col = None;
        let mut station_col = None;
        let mut quantity_cols = Vec::new();

        for (i, header) in headers.iter().enumerate() {
            let header = header.trim().trim_start_matches('\u{feff}');
            if header == DATE_LABEL || header.eq_ignore_ascii_case("date") {
                date_col = Some(i);
            } else if header == STATION_LABEL || header.eq_ignore_ascii_case("station") {
                station_col = Some(i);
            } else if let Ok(q) = header.parse::<Quantity>() {
                quantity_cols.push((i, q));
            }
        }

        let date_col = date_col.context("CSV has no date column (일자 or date)")?;
        let mut table = Self::new(quantity_cols.iter().map(|(_, q)| *q));

        for (row, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("reading CSV row {}", row + 1))?;
            let cell = |i: usize| record.get(i).unwrap_or("");

            let station = station_col
                .map(cell)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            let mut reading = WaterReading::new(station, parse_date(cell(date_col)));
            for (i, q) in &quantity_cols {
                reading.set(*q, parse_number(cell(*i)));
            }
            table.push(reading);
        }

        Ok(table)
    }
}

/// Extracts the untouched item objects from a measuring-service body.
pub fn raw_items_from_api_body(body: &[u8]) -> Result<Vec<Value>> {
    let json: Value =
        serde_json::from_slice(body).context("water-quality response is not valid JSON")?;
    Ok(api_items(&json).to_vec())
}

/// `getWaterMeasuringList.item`, tolerating a single object in place of an
/// array.
fn api_items(json: &Value) -> &[Value] {
    match json.get("getWaterMeasuringList").and_then(|l| l.get("item")) {
        Some(Value::Array(items)) => items,
        Some(item @ Value::Object(_)) => std::slice::from_ref(item),
        _ => &[],
    }
}

fn reading_from_item(item: &Value) -> WaterReading {
    let station = item.get(STATION_FIELD).and_then(value_as_text);
    let date = item.get(DATE_FIELD).and_then(value_as_date);

    let mut reading = WaterReading::new(station, date);
    for (field, quantity) in RENAME_MAP {
        reading.set(*quantity, item.get(*field).and_then(value_as_number));
    }
    reading
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_query_params() {
        let params = WaterQuery::default().to_params();
        let get = |k: &str| params.iter().find(|(p, _)| *p == k).unwrap().1.clone();

        assert_eq!(get("pageNo"), "1");
        assert_eq!(get("numOfRows"), "3000");
        assert_eq!(get("resultType"), "json");
        assert_eq!(get("ptNoList"), "2022A30,2022A10");
        assert_eq!(get("wmyrList"), "2021,2022,2023,2024,2025");
        assert_eq!(get("wmodList"), "01,02,03,04,05,06,07,08,09,10,11,12");
    }

    #[test]
    fn test_rename_map_covers_vocabulary() {
        for q in Quantity::ALL {
            assert_eq!(RENAME_MAP.iter().filter(|(_, m)| *m == q).count(), 1);
        }
    }

    #[test]
    fn test_from_api_body_normalizes_items() {
        let body = r#"{
            "getWaterMeasuringList": {
                "item": [
                    {"PT_NM": "물금", "WMCYMD": "2023.01.05", "ITEM_TEMP": "4.5",
                     "ITEM_PH": "7.9", "ITEM_CLOA": "12.3", "ITEM_TOC": "", "ITEM_AMNT": 150},
                    {"PT_NM": "물금", "WMCYMD": "not a date", "ITEM_TEMP": "abc"}
                ]
            }
        }"#;

        let table = WaterTable::from_api_body(body.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().len(), Quantity::COUNT);

        let first = &table.readings()[0];
        assert_eq!(first.station.as_deref(), Some("물금"));
        assert_eq!(first.date, Some(ymd(2023, 1, 5)));
        assert_eq!(first.get(Quantity::WaterTemp), Some(4.5));
        assert_eq!(first.get(Quantity::ChlorophyllA), Some(12.3));
        assert_eq!(first.get(Quantity::FlowRate), Some(150.0));
        assert_eq!(first.get(Quantity::Toc), None);
        assert_eq!(first.get(Quantity::Bod), None);

        let second = &table.readings()[1];
        assert_eq!(second.date, None);
        assert_eq!(second.get(Quantity::WaterTemp), None);
    }

    #[test]
    fn test_from_api_body_without_items_is_empty_with_schema() {
        let table = WaterTable::from_api_body(br#"{"getWaterMeasuringList": {}}"#).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), &Quantity::ALL);
    }

    #[test]
    fn test_from_api_body_single_object_item() {
        let body = br#"{"getWaterMeasuringList": {"item": {"WMCYMD": "20230301", "ITEM_TP": "0.05"}}}"#;
        let table = WaterTable::from_api_body(body).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.readings()[0].get(Quantity::TotalPhosphorus), Some(0.05));
    }

    #[test]
    fn test_from_api_body_invalid_json() {
        assert!(WaterTable::from_api_body(b"<html>").is_err());
    }

    #[test]
    fn test_raw_items_are_untouched() {
        let body = br#"{"getWaterMeasuringList": {"item": [{"PT_NM": "a", "EXTRA": 1}]}}"#;
        let items = raw_items_from_api_body(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["EXTRA"], 1);
    }

    #[test]
    fn test_from_csv_reader_with_korean_headers() {
        let csv = "총량지점명,일자,수온,유량,비고\n물금,2023-01-02,5.0,100.5,x\n물금,bad,6.0,,y\n";
        let table = WaterTable::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(table.columns(), &[Quantity::WaterTemp, Quantity::FlowRate]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.readings()[0].date, Some(ymd(2023, 1, 2)));
        assert_eq!(table.readings()[0].get(Quantity::FlowRate), Some(100.5));
        assert_eq!(table.readings()[1].date, None);
        assert_eq!(table.readings()[1].get(Quantity::FlowRate), None);
    }

    #[test]
    fn test_from_csv_reader_requires_date_column() {
        let csv = "station,water_temp\na,1.0\n";
        assert!(WaterTable::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_new_dedups_and_orders_columns() {
        let table = WaterTable::new([Quantity::ChlorophyllA, Quantity::WaterTemp, Quantity::ChlorophyllA]);
        assert_eq!(table.columns(), &[Quantity::WaterTemp, Quantity::ChlorophyllA]);
    }
}
