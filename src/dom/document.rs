//! Documents and the realm they live in.
//!
//! A [`Realm`] owns everything the documents of one engine instance share:
//! the node arena, the deferred task queue, the custom element registry,
//! per-node property cells, event listeners and observers, and the setup
//! batch. [`Document`] is a cheap handle to one document node in a realm.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use slotmap::SecondaryMap;

use super::element::Element;
use super::node::{NodeData, NodeId};
use super::selector::{parse_selector_list, SelectorError};
use super::tree::Dom;
use crate::element::setup::SetupQueue;
use crate::element::ElementClass;
use crate::error::{ListenerResult, Result, ZephError};
use crate::event::{fire_immediately, Event, ListenerId, Scheduler};
use crate::observe::Observer;
use crate::reactive::Property;

/// Names the platform reserves even though they contain a dash.
const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Check a custom element name: lowercase ASCII, starts with a letter,
/// contains a dash, and is not reserved.
pub fn validate_element_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| ZephError::InvalidName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };
    let Some(first) = name.chars().next() else {
        return Err(invalid("name is empty"));
    };
    if !first.is_ascii_lowercase() {
        return Err(invalid("must start with a lowercase ASCII letter"));
    }
    if !name.contains('-') {
        return Err(invalid("must contain a dash"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_')))
    {
        return Err(invalid(&format!("unexpected character {bad:?}")));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(invalid("name is reserved"));
    }
    Ok(())
}

/// Listener attached to a node for a named event.
pub type DomListener = Rc<dyn Fn(&Event) -> ListenerResult>;

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) event: String,
    pub(crate) listener: DomListener,
}

// ---------------------------------------------------------------------------
// Realm
// ---------------------------------------------------------------------------

pub(crate) struct Realm {
    pub(crate) dom: RefCell<Dom>,
    pub(crate) scheduler: Scheduler,
    pub(crate) definitions: RefCell<HashMap<String, Rc<ElementClass>>>,
    pub(crate) instances: RefCell<SecondaryMap<NodeId, Rc<ElementClass>>>,
    pub(crate) properties: RefCell<SecondaryMap<NodeId, HashMap<String, Property>>>,
    pub(crate) listeners: RefCell<SecondaryMap<NodeId, Vec<ListenerEntry>>>,
    pub(crate) observers: RefCell<SecondaryMap<NodeId, Observer>>,
    pub(crate) setup: SetupQueue,
    next_listener: Cell<u64>,
}

impl Realm {
    fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            scheduler: Scheduler::new(),
            definitions: RefCell::default(),
            instances: RefCell::default(),
            properties: RefCell::default(),
            listeners: RefCell::default(),
            observers: RefCell::default(),
            setup: SetupQueue::default(),
            next_listener: Cell::new(0),
        }
    }

    pub(crate) fn add_listener(&self, node: NodeId, event: &str, listener: DomListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        let mut listeners = self.listeners.borrow_mut();
        if let Some(entries) = listeners.entry(node) {
            entries.or_default().push(ListenerEntry {
                id,
                event: event.to_owned(),
                listener,
            });
        }
        id
    }

    pub(crate) fn remove_listener(&self, node: NodeId, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(node) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Deliver `event` to `node`, then to its ancestors when the event
    /// bubbles. Bubbling stops at the shadow root.
    pub(crate) fn dispatch(&self, node: NodeId, event: &Event) {
        let path = {
            let dom = self.dom.borrow();
            if !dom.contains(node) {
                return;
            }
            let mut path = vec![node];
            if event.bubbles {
                path.extend(dom.ancestors(node));
            }
            path
        };
        for current in path {
            let matching: Vec<DomListener> = self
                .listeners
                .borrow()
                .get(current)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|entry| entry.event == event.name)
                        .map(|entry| entry.listener.clone())
                        .collect()
                })
                .unwrap_or_default();
            fire_immediately(&event.name, &matching, |listener| listener(event));
        }
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Handle to a document node. Clones refer to the same document.
#[derive(Clone)]
pub struct Document {
    pub(crate) realm: Rc<Realm>,
    pub(crate) node: NodeId,
}

impl Document {
    /// A fresh realm holding one `#document > html > (head, body)` tree.
    pub fn new() -> Self {
        Self::create_in(Rc::new(Realm::new()))
    }

    fn create_in(realm: Rc<Realm>) -> Self {
        let node = {
            let mut dom = realm.dom.borrow_mut();
            let doc = dom.insert(NodeData::document());
            let html = dom.insert_child(doc, NodeData::element("html").with_owner(Some(doc)));
            dom.insert_child(html, NodeData::element("head").with_owner(Some(doc)));
            dom.insert_child(html, NodeData::element("body").with_owner(Some(doc)));
            doc
        };
        Self { realm, node }
    }

    pub(crate) fn from_parts(realm: Rc<Realm>, node: NodeId) -> Self {
        Self { realm, node }
    }

    /// Another document in the same realm, sharing its element registry.
    pub fn create_document(&self) -> Document {
        Self::create_in(self.realm.clone())
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// The document node as an element handle, for tree operations.
    pub fn as_node(&self) -> Element {
        Element::new(self.realm.clone(), self.node)
    }

    /// The `<body>` element, or the document node if it has none.
    pub fn body(&self) -> Element {
        let body = self
            .realm
            .dom
            .borrow()
            .query_by_tag(self.node, "body")
            .first()
            .copied()
            .unwrap_or(self.node);
        Element::new(self.realm.clone(), body)
    }

    /// Create a detached element owned by this document. Registered custom
    /// element tags are constructed immediately.
    pub fn create_element(&self, tag: &str) -> Element {
        let node = self
            .realm
            .dom
            .borrow_mut()
            .insert(NodeData::element(tag).with_owner(Some(self.node)));
        self.realm.upgrade(node);
        Element::new(self.realm.clone(), node)
    }

    /// Register a generated class under its name.
    ///
    /// Registration is permanent: a name can be taken once per realm.
    /// Existing elements with that tag are upgraded, and connected ones get
    /// their connected callback.
    pub fn define_element(&self, class: Rc<ElementClass>) -> Result<()> {
        let name = class.name().to_owned();
        validate_element_name(&name)?;
        {
            let mut definitions = self.realm.definitions.borrow_mut();
            if definitions.contains_key(&name) {
                return Err(ZephError::AlreadyRegistered(name));
            }
            definitions.insert(name.clone(), class);
        }
        tracing::debug!(element = %name, "custom element registered");

        let candidates: Vec<NodeId> = self
            .realm
            .dom
            .borrow()
            .nodes
            .iter()
            .filter(|(_, data)| data.is_element() && data.tag == name)
            .map(|(id, _)| id)
            .collect();
        for node in candidates {
            if self.realm.instance(node).is_some() {
                continue;
            }
            self.realm.upgrade(node);
            let connected = self.realm.dom.borrow().is_connected(node);
            if connected {
                if let Some(class) = self.realm.instance(node) {
                    class.connected(&Element::new(self.realm.clone(), node));
                }
            }
        }
        Ok(())
    }

    /// The class registered under `name`.
    pub fn element_class(&self, name: &str) -> Option<Rc<ElementClass>> {
        self.realm.definitions.borrow().get(name).cloned()
    }

    pub fn is_element_defined(&self, name: &str) -> bool {
        self.realm.definitions.borrow().contains_key(name)
    }

    /// Move `element` into this document: detach it and, if it came from
    /// another document, re-own its subtree and fire adopted callbacks.
    pub fn adopt_node(&self, element: &Element) {
        self.realm.detach(element.node);
        self.realm.adopt(element.node, self.node);
    }

    /// Run every deferred task. Returns how many ran.
    pub fn flush(&self) -> usize {
        self.realm.scheduler.run_pending()
    }

    /// Flush and yield to other local tasks until the queue stays empty.
    pub async fn settle(&self) {
        loop {
            self.flush();
            tokio::task::yield_now().await;
            if self.realm.scheduler.is_empty() {
                break;
            }
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.realm.scheduler
    }

    pub fn add_event_listener(
        &self,
        event: &str,
        listener: impl Fn(&Event) -> ListenerResult + 'static,
    ) -> ListenerId {
        self.realm.add_listener(self.node, event, Rc::new(listener))
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.realm.remove_listener(self.node, id)
    }

    /// Deliver `event` to the document's own listeners.
    pub fn dispatch_event(&self, event: &Event) {
        self.realm.dispatch(self.node, event);
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<Element>, SelectorError> {
        let list = parse_selector_list(selector)?;
        let found = self.realm.dom.borrow().query_selector(self.node, &list);
        Ok(found.map(|node| Element::new(self.realm.clone(), node)))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Element>, SelectorError> {
        let list = parse_selector_list(selector)?;
        let found = self.realm.dom.borrow().query_selector_all(self.node, &list);
        Ok(found
            .into_iter()
            .map(|node| Element::new(self.realm.clone(), node))
            .collect())
    }

    /// Whether two handles refer to the same realm.
    pub fn same_realm(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.realm, &other.realm)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.realm, &other.realm) && self.node == other.node
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("node", &self.node)
            .field("nodes", &self.realm.dom.borrow().len())
            .field("definitions", &self.realm.definitions.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DefinitionContext;

    fn class(name: &str) -> Rc<ElementClass> {
        ElementClass::generate(DefinitionContext::new(name, "http://localhost/"))
    }

    #[test]
    fn name_validation() {
        assert!(validate_element_name("my-badge").is_ok());
        assert!(validate_element_name("x-1.2_b").is_ok());
        for bad in ["", "badge", "My-badge", "1-x", "my badge", "font-face", "my-Badge"] {
            assert!(
                matches!(validate_element_name(bad), Err(ZephError::InvalidName { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn new_document_has_body() {
        let doc = Document::new();
        assert_eq!(doc.body().tag_name(), "body");
        assert!(doc.body().is_connected());
        assert_eq!(doc.body().owner_document(), doc);
    }

    #[test]
    fn define_element_is_permanent() {
        let doc = Document::new();
        doc.define_element(class("x-one")).unwrap();
        assert!(doc.is_element_defined("x-one"));
        assert!(matches!(
            doc.define_element(class("x-one")),
            Err(ZephError::AlreadyRegistered(name)) if name == "x-one"
        ));
        assert!(matches!(doc.define_element(class("nodash")), Err(ZephError::InvalidName { .. })));
    }

    #[test]
    fn create_element_constructs_registered_tags() {
        let doc = Document::new();
        doc.define_element(class("x-two")).unwrap();
        let el = doc.create_element("X-TWO");
        assert_eq!(el.tag_name(), "x-two");
        assert!(el.shadow_root().is_some());
        assert!(doc.create_element("div").shadow_root().is_none());
    }

    #[test]
    fn defining_upgrades_existing_elements() {
        let doc = Document::new();
        doc.body().append_html("<x-late></x-late>");
        let late = doc.query_selector("x-late").unwrap().unwrap();
        assert!(late.shadow_root().is_none());
        doc.define_element(class("x-late")).unwrap();
        assert!(late.shadow_root().is_some());
    }

    #[test]
    fn documents_share_a_realm() {
        let doc = Document::new();
        let other = doc.create_document();
        assert!(doc.same_realm(&other));
        assert_ne!(doc, other);
        doc.define_element(class("x-shared")).unwrap();
        assert!(other.is_element_defined("x-shared"));
    }

    #[test]
    fn document_events() {
        let doc = Document::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = doc.add_event_listener("zeph:ready", move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        doc.dispatch_event(&Event::new("zeph:ready"));
        doc.dispatch_event(&Event::new("other"));
        assert_eq!(hits.get(), 1);
        assert!(doc.remove_event_listener(id));
        doc.dispatch_event(&Event::new("zeph:ready"));
        assert_eq!(hits.get(), 1);
    }
}
