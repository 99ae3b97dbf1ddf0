//! HTTP retrieval behind a small client trait, so credentials can be layered
//! on as decorators ([`auth::UrlParam`], [`auth::ApiKey`]).

mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Context, Result};
use tracing::debug;

/// Builds `base` with `params` appended as query pairs.
pub fn build_url(base: &str, params: &[(&str, String)]) -> Result<reqwest::Url> {
    reqwest::Url::parse_with_params(base, params)
        .with_context(|| format!("invalid endpoint URL '{base}'"))
}

/// Performs a GET through `client` and returns the body.
///
/// # Errors
///
/// Fails on transport errors and on any non-2xx status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: reqwest::Url,
) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("request failed with status {status}: {body}");
    }

    let bytes = resp.bytes().await?.to_vec();
    debug!(status = status.as_u16(), bytes = bytes.len(), "Response received");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_appends_params() {
        let url = build_url(
            "https://example.org/api/list",
            &[("pageNo", "1".to_string()), ("ptNoList", "2022A30,2022A10".to_string())],
        )
        .unwrap();
        assert_eq!(url.path(), "/api/list");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("pageNo".to_string(), "1".to_string()),
                ("ptNoList".to_string(), "2022A30,2022A10".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(build_url("not a url", &[]).is_err());
    }
}
