//! In-memory [`Fetcher`] with scripted latency and failures.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::fetch::{network_error, Fetched, Fetcher};

/// A fetcher serving bodies from a map.
///
/// Unknown URLs are missing (`Ok(false)` / `Ok(None)`). URLs registered with
/// [`with_failure`](Self::with_failure) fail at the transport level. Latency
/// uses tokio timers, so paused-clock tests control it with `advance`.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Fetched>,
    latency: HashMap<String, Duration>,
    default_latency: Duration,
    failures: HashSet<String>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as `text/plain` at `url` (builder).
    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.entries
            .insert(url.to_owned(), Fetched::new(body.as_bytes(), Some("text/plain")));
        self
    }

    /// Serve raw bytes at `url` with an optional content type (builder).
    pub fn with_binary(mut self, url: &str, body: Vec<u8>, content_type: Option<&str>) -> Self {
        self.entries.insert(url.to_owned(), Fetched::new(body, content_type));
        self
    }

    /// Delay every request for `url` (builder).
    pub fn with_latency(mut self, url: &str, latency: Duration) -> Self {
        self.latency.insert(url.to_owned(), latency);
        self
    }

    /// Delay every request without a per-URL latency (builder).
    pub fn with_default_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    /// Make every request for `url` fail at the transport level (builder).
    pub fn with_failure(mut self, url: &str) -> Self {
        self.failures.insert(url.to_owned());
        self
    }

    /// Requests seen so far, as `"HEAD url"` / `"GET url"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    async fn begin(&self, method: &str, url: &str) -> Result<()> {
        self.requests.borrow_mut().push(format!("{method} {url}"));
        let latency = self.latency.get(url).copied().unwrap_or(self.default_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failures.contains(url) {
            return Err(network_error(url, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Fetcher for MemoryFetcher {
    async fn head(&self, url: &str) -> Result<bool> {
        self.begin("HEAD", url).await?;
        Ok(self.entries.contains_key(url))
    }

    async fn get(&self, url: &str) -> Result<Option<Fetched>> {
        self.begin("GET", url).await?;
        Ok(self.entries.get(url).cloned())
    }
}
