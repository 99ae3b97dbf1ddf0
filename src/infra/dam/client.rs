use anyhow::{Context, Result};
use async_trait::async_trait;
use estuary_monthly::dam::{DamQuery, DamTable};
use estuary_monthly::fetch::auth::{ApiKey, UrlParam};
use estuary_monthly::fetch::{BasicClient, HttpClient, build_url, fetch_bytes};
use std::str::FromStr;
use tracing::info;

use crate::services::sources::DamApi;

/// How the dam gateway receives the service key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DamAuth {
    /// `serviceKey` query parameter.
    #[default]
    Query,
    /// `Authorization: Infuser <key>` header.
    Header,
}

impl FromStr for DamAuth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" => Ok(DamAuth::Query),
            "header" => Ok(DamAuth::Header),
            other => anyhow::bail!("unknown dam auth mode '{other}' (expected query or header)"),
        }
    }
}

/// Client for the estuary-barrage discharge dataset. Fetches a single page.
pub struct DamClient {
    base_url: String,
    query: DamQuery,
    http: Box<dyn HttpClient>,
}

impl DamClient {
    pub fn new(base_url: String, service_key: String, auth: DamAuth, query: DamQuery) -> Result<Self> {
        let basic = BasicClient::new()?;
        let http: Box<dyn HttpClient> = match auth {
            DamAuth::Query => Box::new(UrlParam::service_key(basic, service_key)),
            DamAuth::Header => Box::new(ApiKey::infuser(basic, &service_key)?),
        };
        Ok(Self {
            base_url,
            query,
            http,
        })
    }
}

#[async_trait]
impl DamApi for DamClient {
    #[tracing::instrument(skip_all)]
    async fn fetch_records(&self) -> Result<DamTable> {
        let url = build_url(&self.base_url, &self.query.to_params())?;
        let body = fetch_bytes(self.http.as_ref(), url)
            .await
            .context("dam request failed")?;
        let table = DamTable::from_api_body(&body)?;
        info!(rows = table.len(), "Dam records fetched");
        Ok(table)
    }
}
