mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// GETs `url` and decodes the JSON body.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: Url) -> Result<T> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);
    read_json(client.execute(req).await?).await
}

/// POSTs `body` as JSON to `url` and decodes the JSON reply.
pub async fn post_json<C: HttpClient, B: Serialize, T: DeserializeOwned>(
    client: &C,
    url: Url,
    body: &B,
) -> Result<T> {
    let mut req = reqwest::Request::new(reqwest::Method::POST, url);
    req.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());
    read_json(client.execute(req).await?).await
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("API returned status {}: {}", status, body);
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).context("failed to parse JSON response")
}
