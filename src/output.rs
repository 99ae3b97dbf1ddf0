//! Export of the water, dam and merged tables.
//!
//! Supports CSV (optionally gzip-compressed), JSON, and a logged preview of
//! the first rows.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::aligner::MergedTable;
use crate::dam::{DISCHARGE_COLUMN, DamTable, RAINFALL_COLUMN};
use crate::water::WaterTable;

/// A table that can be flattened into CSV rows. Missing values are empty
/// cells; the first column is always `date`.
pub trait CsvExport {
    fn csv_header(&self) -> Vec<String>;
    fn csv_records(&self) -> Vec<Vec<String>>;
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn number_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvExport for WaterTable {
    fn csv_header(&self) -> Vec<String> {
        let mut header = vec!["date".to_string(), "station".to_string()];
        header.extend(self.columns().iter().map(|q| q.name().to_string()));
        header
    }

    fn csv_records(&self) -> Vec<Vec<String>> {
        self.readings()
            .iter()
            .map(|r| {
                let mut row = vec![date_cell(r.date), r.station.clone().unwrap_or_default()];
                row.extend(self.columns().iter().map(|q| number_cell(r.get(*q))));
                row
            })
            .collect()
    }
}

impl CsvExport for DamTable {
    fn csv_header(&self) -> Vec<String> {
        vec![
            "date".to_string(),
            DISCHARGE_COLUMN.to_string(),
            RAINFALL_COLUMN.to_string(),
        ]
    }

    fn csv_records(&self) -> Vec<Vec<String>> {
        self.records()
            .iter()
            .map(|r| {
                vec![
                    date_cell(r.date),
                    number_cell(r.discharge_total),
                    number_cell(r.rainfall_total),
                ]
            })
            .collect()
    }
}

impl CsvExport for MergedTable {
    fn csv_header(&self) -> Vec<String> {
        let mut header = vec!["date".to_string()];
        header.extend(self.columns().iter().map(|c| c.name().to_string()));
        header
    }

    fn csv_records(&self) -> Vec<Vec<String>> {
        self.rows()
            .iter()
            .map(|r| {
                let mut row = vec![date_cell(Some(r.date))];
                row.extend(r.values.iter().map(|v| v.to_string()));
                row
            })
            .collect()
    }
}

/// Writes `table` as CSV, header included.
pub fn write_csv<T: CsvExport, W: Write>(writer: W, table: &T) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(table.csv_header())?;
    for record in table.csv_records() {
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `table` as CSV to `path`, gzip-compressed when `gzip` is set.
/// Parent directories are created as needed.
pub fn export_csv<T: CsvExport>(path: &str, table: &T, gzip: bool) -> Result<()> {
    let file = create_file(path)?;
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_csv(&mut encoder, table)?;
        encoder.finish()?;
    } else {
        write_csv(file, table)?;
    }
    info!(path, gzip, "CSV written");
    Ok(())
}

/// Writes any serializable value as pretty-printed JSON to `path`.
pub fn export_json(path: &str, value: &impl Serialize) -> Result<()> {
    let file = create_file(path)?;
    serde_json::to_writer_pretty(file, value)?;
    info!(path, "JSON written");
    Ok(())
}

/// Logs the header and the first `n` rows of a table.
pub fn log_preview<T: CsvExport>(table: &T, n: usize) {
    info!(columns = %table.csv_header().join(","), "Table preview");
    for record in table.csv_records().iter().take(n) {
        info!("{}", record.join(","));
    }
}

fn create_file(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }
    debug!(path, "Creating output file");
    File::create(path).with_context(|| format!("creating {path}"))
}
