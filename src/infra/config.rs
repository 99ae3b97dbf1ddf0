use anyhow::{Context, Result};
use estuary_monthly::dam::DAM_API_URL;
use estuary_monthly::water::WATER_API_URL;

use crate::infra::dam::DamAuth;

/// Service keys and endpoints, read from the environment (and `.env`).
///
/// | Variable | Meaning |
/// |---|---|
/// | `WATER_API_KEY` | service key of the water-quality API |
/// | `DAM_API_KEY` | service key of the dam API |
/// | `WATER_API_URL` | endpoint override |
/// | `DAM_API_URL` | endpoint override |
/// | `DAM_AUTH` | `query` (default) or `header` |
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    water_key: Option<String>,
    dam_key: Option<String>,
    pub water_url: String,
    pub dam_url: String,
    pub dam_auth: DamAuth,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let dam_auth = match get("DAM_AUTH") {
            Some(mode) => mode.parse::<DamAuth>().context("invalid DAM_AUTH")?,
            None => DamAuth::default(),
        };

        Ok(Self {
            water_key: get("WATER_API_KEY"),
            dam_key: get("DAM_API_KEY"),
            water_url: get("WATER_API_URL").unwrap_or_else(|| WATER_API_URL.to_string()),
            dam_url: get("DAM_API_URL").unwrap_or_else(|| DAM_API_URL.to_string()),
            dam_auth,
        })
    }

    pub fn water_key(&self) -> Result<String> {
        self.water_key
            .clone()
            .context("WATER_API_KEY must be set to call the water-quality API")
    }

    pub fn dam_key(&self) -> Result<String> {
        self.dam_key
            .clone()
            .context("DAM_API_KEY must be set to call the dam API")
    }
}
