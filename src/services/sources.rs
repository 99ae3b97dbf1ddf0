//! Traits for the two measurement services and their failure policy.
//!
//! A failed fetch never aborts alignment: the caller gets an empty table with
//! the expected schema and the cause is logged.

use anyhow::Result;
use async_trait::async_trait;
use estuary_monthly::dam::DamTable;
use estuary_monthly::water::WaterTable;
use serde_json::Value;
use tracing::error;

/// Source of water-quality measurements.
#[async_trait]
pub trait WaterQualityApi: Send + Sync {
    /// Returns readings renamed to the quantity vocabulary.
    async fn fetch_readings(&self) -> Result<WaterTable>;

    /// Returns the untouched item objects.
    async fn fetch_raw_items(&self) -> Result<Vec<Value>>;
}

/// Source of monthly dam totals.
#[async_trait]
pub trait DamApi: Send + Sync {
    async fn fetch_records(&self) -> Result<DamTable>;
}

/// Readings, or an empty full-schema table when the fetch fails.
pub async fn readings_or_empty(api: &dyn WaterQualityApi) -> WaterTable {
    match api.fetch_readings().await {
        Ok(table) => table,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Water-quality fetch failed, continuing with no readings");
            WaterTable::with_all_quantities()
        }
    }
}

/// Dam records, or an empty table when the fetch fails.
pub async fn records_or_empty(api: &dyn DamApi) -> DamTable {
    match api.fetch_records().await {
        Ok(table) => table,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Dam fetch failed, continuing with no records");
            DamTable::default()
        }
    }
}
