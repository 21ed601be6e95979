//! HTTP fetcher backed by `reqwest`.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::fetch::{network_error, Fetched, Fetcher};
use crate::error::Result;

/// Fetches resources over HTTP(S).
///
/// A URL that does not parse is reported as missing rather than as a
/// transport failure, so literal markup probed as a filename falls through.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (timeouts, proxies, headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl Fetcher for HttpFetcher {
    async fn head(&self, url: &str) -> Result<bool> {
        if url::Url::parse(url).is_err() {
            return Ok(false);
        }
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|err| network_error(url, err))?;
        Ok(response.status().is_success())
    }

    async fn get(&self, url: &str) -> Result<Option<Fetched>> {
        if url::Url::parse(url).is_err() {
            return Ok(None);
        }
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| network_error(url, err))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "resource missing");
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|err| network_error(url, err))?;

        Ok(Some(Fetched {
            body: body.to_vec(),
            content_type,
        }))
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}
