//! Per-element handler registry for attribute and content mutations.
//!
//! One [`Observer`] exists per watched node, created lazily by the realm the
//! first time a handler is registered. The realm delivers mutation records to
//! it: attribute records re-read the current value and reach the handlers for
//! that attribute name; any child-list or character-data change re-reads the
//! text content and reaches every content handler.

use std::collections::HashMap;
use std::rc::Rc;

/// Receives the attribute's current value after a mutation.
pub type AttributeHandler = Rc<dyn Fn(Option<&str>)>;

/// Receives the element's current text content after a mutation.
pub type ContentHandler = Rc<dyn Fn(&str)>;

/// Identifies a registered handler on one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
pub struct Observer {
    attributes: HashMap<String, Vec<(HandlerId, AttributeHandler)>>,
    content: Vec<(HandlerId, ContentHandler)>,
    next: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next);
        self.next += 1;
        id
    }

    pub fn add_attribute(&mut self, name: &str, handler: AttributeHandler) -> HandlerId {
        let id = self.next_id();
        self.attributes
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push((id, handler));
        id
    }

    pub fn remove_attribute(&mut self, name: &str, id: HandlerId) -> bool {
        let name = name.to_ascii_lowercase();
        let Some(handlers) = self.attributes.get_mut(&name) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(hid, _)| *hid != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            self.attributes.remove(&name);
        }
        removed
    }

    pub fn add_content(&mut self, handler: ContentHandler) -> HandlerId {
        let id = self.next_id();
        self.content.push((id, handler));
        id
    }

    pub fn remove_content(&mut self, id: HandlerId) -> bool {
        let before = self.content.len();
        self.content.retain(|(hid, _)| *hid != id);
        self.content.len() != before
    }

    /// Snapshot of the handlers for `name`, in registration order.
    pub fn attribute_handlers(&self, name: &str) -> Vec<AttributeHandler> {
        self.attributes
            .get(name)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the content handlers, in registration order.
    pub fn content_handlers(&self) -> Vec<ContentHandler> {
        self.content.iter().map(|(_, h)| h.clone()).collect()
    }

    pub fn has_content_handlers(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.content.is_empty()
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.attributes.keys().collect();
        names.sort();
        f.debug_struct("Observer")
            .field("attributes", &names)
            .field("content", &self.content.len())
            .finish()
    }
}
