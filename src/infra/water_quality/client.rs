use anyhow::{Context, Result};
use async_trait::async_trait;
use estuary_monthly::fetch::auth::UrlParam;
use estuary_monthly::fetch::{BasicClient, build_url, fetch_bytes};
use estuary_monthly::water::{WaterQuery, WaterTable, raw_items_from_api_body};
use serde_json::Value;
use tracing::info;

use crate::services::sources::WaterQualityApi;

/// Client for the water-quality measuring list. Fetches a single page.
pub struct WaterQualityClient {
    base_url: String,
    query: WaterQuery,
    http: UrlParam<BasicClient>,
}

impl WaterQualityClient {
    pub fn new(base_url: String, service_key: String, query: WaterQuery) -> Result<Self> {
        Ok(Self {
            base_url,
            query,
            http: UrlParam::service_key(BasicClient::new()?, service_key),
        })
    }

    #[tracing::instrument(skip(self), fields(stations = %self.query.stations.join(",")))]
    async fn fetch_body(&self) -> Result<Vec<u8>> {
        let url = build_url(&self.base_url, &self.query.to_params())?;
        fetch_bytes(&self.http, url)
            .await
            .context("water-quality request failed")
    }
}

#[async_trait]
impl WaterQualityApi for WaterQualityClient {
    async fn fetch_readings(&self) -> Result<WaterTable> {
        let body = self.fetch_body().await?;
        let table = WaterTable::from_api_body(&body)?;
        info!(rows = table.len(), "Water-quality readings fetched");
        Ok(table)
    }

    async fn fetch_raw_items(&self) -> Result<Vec<Value>> {
        let body = self.fetch_body().await?;
        raw_items_from_api_body(&body)
    }
}
