use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// Header name and value are validated once, at construction, so `execute`
/// cannot fail on them.
pub struct ApiKey<C> {
    pub inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Sends `key` verbatim in `header_name` (e.g. `X-API-KEY` for Outscraper,
    /// `x-goog-api-key` for Gemini).
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut key = HeaderValue::from_str(key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    #[test]
    fn test_rejects_invalid_header_parts() {
        assert!(ApiKey::new(BasicClient::new(), "bad header", "k").is_err());
        assert!(ApiKey::new(BasicClient::new(), "X-API-KEY", "line\nbreak").is_err());
        assert!(ApiKey::new(BasicClient::new(), "X-API-KEY", "abc123").is_ok());
    }
}
