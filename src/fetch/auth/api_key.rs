use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Sets `header_name: value` on every request.
    ///
    /// # Errors
    ///
    /// Returns an error if either part is not a valid header token.
    pub fn new(inner: C, header_name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut value = HeaderValue::from_str(value).context("API key is not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// `Authorization: Infuser <key>`, the header form of the odcloud gateway.
    pub fn infuser(inner: C, key: &str) -> Result<Self> {
        Self::new(inner, "Authorization", &format!("Infuser {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    #[test]
    fn test_infuser_header() {
        let client = ApiKey::infuser(Unused, "abc123").unwrap();
        assert_eq!(client.header_name.as_str(), "authorization");
        assert_eq!(client.value.to_str().unwrap(), "Infuser abc123");
        assert!(client.value.is_sensitive());
    }

    #[test]
    fn test_rejects_invalid_header_value() {
        assert!(ApiKey::new(Unused, "Authorization", "bad\nvalue").is_err());
        assert!(ApiKey::new(Unused, "bad header", "v").is_err());
    }
}
