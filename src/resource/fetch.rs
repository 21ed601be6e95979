//! Transport seam for resource lookups, plus local `data:` URL decoding.

use async_trait::async_trait;
use base64::Engine;

use crate::error::{Result, ZephError};

/// A successfully fetched body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Fetched {
    pub fn new(body: impl Into<Vec<u8>>, content_type: Option<&str>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.map(str::to_owned),
        }
    }
}

/// Performs the network side of resource resolution.
///
/// Transport failures are `Err`; a response that is not OK is `Ok(false)`
/// from `head` and `Ok(None)` from `get`.
#[async_trait(?Send)]
pub trait Fetcher {
    /// Probe whether `url` exists.
    async fn head(&self, url: &str) -> Result<bool>;

    /// Fetch the body at `url`.
    async fn get(&self, url: &str) -> Result<Option<Fetched>>;
}

/// Decode a `data:` URL into its body and media type.
///
/// Returns `None` for anything that is not a well-formed `data:` URL.
pub fn decode_data_url(url: &str) -> Option<Fetched> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let (media, is_base64) = match meta.strip_suffix(";base64") {
        Some(media) => (media, true),
        None => (meta, false),
    };
    let body = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?
    } else {
        percent_encoding::percent_decode_str(payload).collect()
    };
    let content_type = if media.is_empty() {
        "text/plain;charset=US-ASCII".to_owned()
    } else {
        media.to_owned()
    };
    Some(Fetched {
        body,
        content_type: Some(content_type),
    })
}

/// Map a transport error from any source into [`ZephError::Network`].
pub fn network_error(url: &str, err: impl std::fmt::Display) -> ZephError {
    ZephError::Network {
        url: url.to_owned(),
        message: err.to_string(),
    }
}
