//! Resource resolution: URL joining, existence probes, text and binary
//! fetches, and the filename-or-literal disambiguation used by html/css.

pub mod fetch;
#[cfg(feature = "http")]
pub mod http;
pub mod resolver;

pub use fetch::{decode_data_url, Fetched, Fetcher};
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use resolver::{resolve, Binary, Resolver, DEFAULT_BINARY_TYPE};
