//! Shared services: named emitters components use for cross-component
//! pub/sub, tracked per document.

mod registry;
#[allow(clippy::module_inception)]
mod service;

pub use registry::ServiceRegistry;
pub use service::Service;
