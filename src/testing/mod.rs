//! Test support: an in-memory fetcher and a harness bundling a document,
//! that fetcher and a registry.

pub mod harness;
pub mod memory;

pub use harness::Harness;
pub use memory::MemoryFetcher;
