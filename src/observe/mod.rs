//! Mutation observation: per-element attribute and content handler sets.

pub mod observer;

pub use observer::{AttributeHandler, ContentHandler, HandlerId, Observer};
