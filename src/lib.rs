//! # zeph
//!
//! A declarative engine for defining custom elements.
//!
//! A component is described by a definition function that calls directives
//! (`html`, `css`, `asset`, `attribute`, `property`, `bind`, `from`, the
//! lifecycle hooks and event handlers). The registry runs the function,
//! waits for its resources, merges any parent definition, and registers a
//! generated element class with a headless document. Instances get a shadow
//! root with the accumulated markup and styles, then a batched setup pass
//! that applies initial values, wires bindings and attaches handlers.
//!
//! ## Core Systems
//!
//! - **[`dom`]**: slotmap-backed document tree, selectors, markup, elements
//! - **[`context`]**: definition contexts, directives and inheritance
//! - **[`element`]**: generated element classes, setup and bindings
//! - **[`registry`]**: component catalog, define handles and the ready signal
//! - **[`event`]**: deferred task queue, events and emitters
//! - **[`reactive`]**: observable property cells
//! - **[`observe`]**: per-element attribute and content observers
//! - **[`resource`]**: URL resolution and the [`Fetcher`](resource::Fetcher) seam
//! - **[`service`]**: named emitters shared between components
//! - **[`testing`]**: memory fetcher and test harness
//!
//! Everything is single-threaded. Definitions run on a tokio
//! [`LocalSet`](tokio::task::LocalSet), and deferred callbacks run when the
//! document's queue is drained with [`Document::flush`] or
//! [`Document::settle`].

// Foundation
pub mod config;
pub mod error;
pub mod value;

// Document model
pub mod dom;
pub mod event;
pub mod observe;
pub mod reactive;

// Definitions
pub mod context;
pub mod element;
pub mod registry;
pub mod resource;
pub mod service;

pub mod testing;

pub use config::ZephConfig;
pub use context::Definition;
pub use dom::{Document, Element};
pub use element::ElementClass;
pub use error::{ListenerResult, Result, ZephError};
pub use registry::{Component, DefineHandle, Registry};
pub use service::{Service, ServiceRegistry};
pub use value::Value;
