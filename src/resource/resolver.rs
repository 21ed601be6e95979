//! URL resolution and resource probing on top of a [`Fetcher`].
//!
//! A directive argument can be inline content or a filename reference; the
//! resolver disambiguates by probing the network (`resolve_name`) and only
//! falls back to the literal when nothing exists.

use std::fmt;
use std::rc::Rc;

use base64::Engine;
use url::{ParseError, Url};

use super::fetch::{decode_data_url, Fetched, Fetcher};
use crate::error::Result;

/// Content type used when a binary response does not declare one.
pub const DEFAULT_BINARY_TYPE: &str = "application/octet-stream";

/// A binary resource as base64 text plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub data: String,
    pub content_type: String,
}

impl Binary {
    /// `data:{content_type};base64,{data}`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.data)
    }
}

/// Resolve `url` against `base`.
///
/// `data:` URLs pass through unchanged. Returns `None` for input that cannot
/// be made absolute.
pub fn resolve(url: &str, base: &str) -> Option<String> {
    if url.starts_with("data:") {
        return Some(url.to_owned());
    }
    match Url::parse(url) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|base| base.join(url))
            .ok()
            .map(|joined| joined.to_string()),
        Err(_) => None,
    }
}

/// Resource lookups shared by every definition of a registry.
#[derive(Clone)]
pub struct Resolver {
    fetcher: Rc<dyn Fetcher>,
}

impl Resolver {
    pub fn new(fetcher: Rc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// HEAD probe. `data:` URLs always exist.
    pub async fn exists(&self, url: &str) -> Result<bool> {
        if url.starts_with("data:") {
            return Ok(decode_data_url(url).is_some());
        }
        self.fetcher.head(url).await
    }

    async fn fetch(&self, url: &str) -> Result<Option<Fetched>> {
        if url.starts_with("data:") {
            return Ok(decode_data_url(url));
        }
        self.fetcher.get(url).await
    }

    /// Body as text (lossy UTF-8), or `None` when the response was not OK.
    pub async fn fetch_text(&self, url: &str) -> Result<Option<String>> {
        Ok(self
            .fetch(url)
            .await?
            .map(|fetched| String::from_utf8_lossy(&fetched.body).into_owned()))
    }

    /// Body as base64 plus content type, or `None` when the response was not OK.
    pub async fn fetch_binary(&self, url: &str) -> Result<Option<Binary>> {
        Ok(self.fetch(url).await?.map(|fetched| Binary {
            data: base64::engine::general_purpose::STANDARD.encode(&fetched.body),
            content_type: fetched
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| DEFAULT_BINARY_TYPE.to_owned()),
        }))
    }

    /// Probe, in order: the reference resolved against `base`, the literal
    /// reference, then both again with `extension` appended. Returns the first
    /// candidate that exists.
    pub async fn resolve_name(&self, reference: &str, base: &str, extension: &str) -> Result<Option<String>> {
        let with_extension = format!("{reference}{extension}");
        let candidates = [
            resolve(reference, base),
            Some(reference.to_owned()),
            resolve(&with_extension, base),
            Some(with_extension.clone()),
        ];

        let mut tried: Vec<String> = Vec::new();
        for candidate in candidates.into_iter().flatten() {
            if tried.contains(&candidate) {
                continue;
            }
            tried.push(candidate.clone());
            if self.exists(&candidate).await? {
                tracing::debug!(reference, url = %candidate, "resolved resource name");
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Treat `content` as a possible filename: return the fetched text when
    /// a matching resource exists, otherwise `content` itself.
    pub async fn resolve_content(&self, content: &str, base: &str, extension: &str) -> Result<String> {
        if let Some(url) = self.resolve_name(content, base, extension).await? {
            if let Some(text) = self.fetch_text(&url).await? {
                return Ok(text);
            }
        }
        Ok(content.to_owned())
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}
