use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Value, json};

use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, post_json};
use crate::services::NarrativeBackend;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Text generation through the Gemini `generateContent` endpoint.
pub struct GeminiClient<C = ApiKey<BasicClient>> {
    http: C,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        let http = ApiKey::new(BasicClient::with_timeout(TIMEOUT)?, "x-goog-api-key", api_key)?;
        Ok(Self::with_client(http, BASE_URL, model))
    }
}

impl<C> GeminiClient<C> {
    pub fn with_client(http: C, base_url: &str, model: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn endpoint(&self) -> Result<Url> {
        Url::parse(&format!("{}/{}:generateContent", self.base_url, self.model))
            .context("invalid Gemini endpoint")
    }
}

/// Concatenates the text parts of the first candidate.
pub fn reply_text(response: &Value) -> Option<String> {
    let parts = response["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl<C: HttpClient> NarrativeBackend for GeminiClient<C> {
    #[tracing::instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let response: Value = post_json(&self.http, self.endpoint()?, &body)
            .await
            .context("Gemini request failed")?;

        match reply_text(&response) {
            Some(text) => Ok(text),
            None => bail!("Gemini returned no text"),
        }
    }
}
