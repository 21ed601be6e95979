//! Headless DOM: slotmap arena, selectors, markup, documents and element
//! handles.

pub mod document;
pub mod element;
pub mod markup;
mod mutation;
pub mod node;
pub mod query;
pub mod selector;
pub mod tree;

pub use document::{validate_element_name, Document, DomListener};
pub use element::{Element, WeakElement};
pub use node::{NodeData, NodeId, NodeKind};
pub use selector::{parse_selector_list, SelectorError, SelectorList};
pub use tree::Dom;
