//! Element handles.
//!
//! An [`Element`] pairs a realm with a node id. It is the surface both the
//! engine and listener code use to read and mutate the tree; every mutation
//! goes through here so callbacks and observers see it.

use std::fmt;
use std::rc::{Rc, Weak};

use super::document::{Document, Realm};
use super::markup::{parse_into, serialize_children, serialize_node};
use super::node::{NodeData, NodeId, NodeKind};
use super::selector::{parse_selector_list, SelectorError, SelectorList};
use crate::error::ListenerResult;
use crate::event::{Event, ListenerId};
use crate::observe::HandlerId;
use crate::reactive::Property;
use crate::value::Value;

/// Strong handle to a node. Clones refer to the same node.
#[derive(Clone)]
pub struct Element {
    pub(crate) realm: Rc<Realm>,
    pub(crate) node: NodeId,
}

/// Non-owning handle, used by closures the realm itself stores.
#[derive(Clone)]
pub struct WeakElement {
    realm: Weak<Realm>,
    node: NodeId,
}

impl WeakElement {
    /// The element, if its realm is alive and the node still exists.
    pub fn upgrade(&self) -> Option<Element> {
        let realm = self.realm.upgrade()?;
        let exists = realm.dom.borrow().contains(self.node);
        exists.then(|| Element::new(realm, self.node))
    }
}

impl Element {
    pub(crate) fn new(realm: Rc<Realm>, node: NodeId) -> Self {
        Self { realm, node }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            realm: Rc::downgrade(&self.realm),
            node: self.node,
        }
    }

    fn with_data<R>(&self, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
        self.realm.dom.borrow().get(self.node).map(f)
    }

    fn handle(&self, node: NodeId) -> Element {
        Element::new(self.realm.clone(), node)
    }

    // -- identity and tree ------------------------------------------------

    /// Lowercase tag name (`#text`, `#shadow-root`, ... for other kinds).
    pub fn tag_name(&self) -> String {
        self.with_data(|data| data.tag.clone()).unwrap_or_default()
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.with_data(|data| data.kind)
    }

    pub fn parent(&self) -> Option<Element> {
        let parent = self.realm.dom.borrow().parent(self.node);
        parent.map(|node| self.handle(node))
    }

    pub fn children(&self) -> Vec<Element> {
        let children = self.realm.dom.borrow().children(self.node).to_vec();
        children.into_iter().map(|node| self.handle(node)).collect()
    }

    /// Element children only.
    pub fn element_children(&self) -> Vec<Element> {
        self.children()
            .into_iter()
            .filter(|child| child.kind() == Some(NodeKind::Element))
            .collect()
    }

    pub fn owner_document(&self) -> Document {
        let owner = self.realm.document_of(self.node).unwrap_or(self.node);
        Document::from_parts(self.realm.clone(), owner)
    }

    pub fn is_connected(&self) -> bool {
        self.realm.dom.borrow().is_connected(self.node)
    }

    /// Whether this node was constructed by a registered custom element class.
    pub fn is_custom(&self) -> bool {
        self.realm.instance(self.node).is_some()
    }

    // -- attributes -------------------------------------------------------

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.with_data(|data| data.attribute(&name).map(str::to_owned))
            .flatten()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Set an attribute. Always produces an attribute record, even when the
    /// value is unchanged.
    pub fn set_attribute(&self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let old = {
            let mut dom = self.realm.dom.borrow_mut();
            match dom.get_mut(self.node) {
                Some(data) if data.is_element() => data.set_attribute(&name, value),
                _ => return,
            }
        };
        self.realm
            .attribute_changed(self.node, &name, old.as_deref(), Some(value));
    }

    /// Remove an attribute. No record when it was absent.
    pub fn remove_attribute(&self, name: &str) {
        let name = name.to_ascii_lowercase();
        let old = {
            let mut dom = self.realm.dom.borrow_mut();
            match dom.get_mut(self.node) {
                Some(data) => data.remove_attribute(&name),
                None => return,
            }
        };
        if let Some(old) = old {
            self.realm.attribute_changed(self.node, &name, Some(&old), None);
        }
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.with_data(|data| data.attributes.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    // -- content ----------------------------------------------------------

    pub fn text_content(&self) -> String {
        self.realm.dom.borrow().text_content(self.node)
    }

    /// Replace all children with a single text node (none for `""`). On text
    /// and comment nodes this replaces the payload.
    pub fn set_text_content(&self, text: &str) {
        match self.kind() {
            None => return,
            Some(NodeKind::Text | NodeKind::Comment) => {
                if let Some(data) = self.realm.dom.borrow_mut().get_mut(self.node) {
                    data.text = text.to_owned();
                }
                self.realm.content_changed(self.node);
                return;
            }
            Some(_) => {}
        }
        let removed = self.clear_children();
        if !text.is_empty() {
            let owner = self.realm.document_of(self.node);
            self.realm
                .dom
                .borrow_mut()
                .insert_child(self.node, NodeData::text(text).with_owner(owner));
        }
        self.after_removal(removed);
        self.realm.content_changed(self.node);
    }

    /// Detach element children and delete everything else. Returns the
    /// detached elements and whether this node was connected.
    fn clear_children(&self) -> (Vec<NodeId>, bool) {
        let mut dom = self.realm.dom.borrow_mut();
        let connected = dom.is_connected(self.node);
        let mut detached = Vec::new();
        for child in dom.children(self.node).to_vec() {
            if dom.get(child).is_some_and(NodeData::is_element) {
                dom.detach(child);
                detached.push(child);
            } else {
                dom.remove(child);
            }
        }
        (detached, connected)
    }

    fn after_removal(&self, (detached, was_connected): (Vec<NodeId>, bool)) {
        if was_connected {
            for node in detached {
                self.realm.disconnected_subtree(node);
            }
        }
    }

    /// Append `child`, moving it from wherever it was. Inserting a node
    /// into its own subtree is ignored.
    pub fn append_child(&self, child: &Element) {
        if !Rc::ptr_eq(&self.realm, &child.realm) {
            tracing::warn!("cannot move a node between realms");
            return;
        }
        if self.realm.contains_composed(child.node, self.node) {
            tracing::warn!(parent = %self.tag_name(), child = %child.tag_name(), "ignoring insertion that would create a cycle");
            return;
        }
        self.realm.detach(child.node);
        if let Some(document) = self.realm.document_of(self.node) {
            self.realm.adopt(child.node, document);
        }
        self.realm.dom.borrow_mut().reparent(child.node, self.node);
        self.realm.content_changed(self.node);
        if self.is_connected() {
            self.realm.connected_subtree(child.node);
        }
    }

    /// Detach from the parent. The handle stays valid.
    pub fn remove(&self) {
        self.realm.detach(self.node);
    }

    /// Parse `markup` and append the nodes. Registered custom elements in
    /// the markup are constructed.
    pub fn append_html(&self, markup: &str) {
        let added = {
            let mut dom = self.realm.dom.borrow_mut();
            if !dom.contains(self.node) {
                return;
            }
            let owner = match dom.get(self.node).map(|data| data.kind) {
                Some(NodeKind::Document) => Some(self.node),
                _ => dom.owner(self.node),
            };
            parse_into(&mut dom, self.node, owner, markup)
        };
        for &node in &added {
            self.realm.upgrade_subtree(node);
        }
        self.realm.content_changed(self.node);
        if self.is_connected() {
            for node in added {
                self.realm.connected_subtree(node);
            }
        }
    }

    /// Replace all children with parsed `markup`.
    pub fn set_inner_html(&self, markup: &str) {
        let removed = self.clear_children();
        self.after_removal(removed);
        self.append_html(markup);
    }

    /// Serialized light-tree children.
    pub fn inner_html(&self) -> String {
        serialize_children(&self.realm.dom.borrow(), self.node)
    }

    pub fn outer_html(&self) -> String {
        serialize_node(&self.realm.dom.borrow(), self.node)
    }

    // -- shadow -----------------------------------------------------------

    /// Attach a shadow root, or return the existing one.
    pub fn attach_shadow(&self) -> Element {
        let root = self.realm.dom.borrow_mut().attach_shadow(self.node);
        self.handle(root)
    }

    pub fn shadow_root(&self) -> Option<Element> {
        let root = self.realm.dom.borrow().shadow_root(self.node);
        root.map(|node| self.handle(node))
    }

    /// The host of a shadow root.
    pub fn host(&self) -> Option<Element> {
        let host = self.realm.dom.borrow().host(self.node);
        host.map(|node| self.handle(node))
    }

    // -- queries ----------------------------------------------------------

    pub fn query_selector(&self, selector: &str) -> Result<Option<Element>, SelectorError> {
        let list = parse_selector_list(selector)?;
        Ok(self.query_first(&list))
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Element>, SelectorError> {
        let list = parse_selector_list(selector)?;
        Ok(self.query_list(&list))
    }

    pub(crate) fn query_first(&self, list: &SelectorList) -> Option<Element> {
        let found = self.realm.dom.borrow().query_selector(self.node, list);
        found.map(|node| self.handle(node))
    }

    pub(crate) fn query_list(&self, list: &SelectorList) -> Vec<Element> {
        let found = self.realm.dom.borrow().query_selector_all(self.node, list);
        found.into_iter().map(|node| self.handle(node)).collect()
    }

    // -- style ------------------------------------------------------------

    /// Inline style declaration, e.g. `background-image`.
    pub fn style(&self, property: &str) -> Option<String> {
        self.with_data(|data| data.style(property).map(str::to_owned))
            .flatten()
    }

    pub fn set_style(&self, property: &str, value: &str) {
        if let Some(data) = self.realm.dom.borrow_mut().get_mut(self.node) {
            data.set_style(property, value);
        }
    }

    // -- properties -------------------------------------------------------

    /// The property cell for `name`, created empty on first access.
    pub fn property_cell(&self, name: &str) -> Property {
        let mut properties = self.realm.properties.borrow_mut();
        match properties.entry(self.node) {
            Some(entry) => entry
                .or_default()
                .entry(name.to_owned())
                .or_default()
                .clone(),
            None => Property::default(),
        }
    }

    fn existing_cell(&self, name: &str) -> Option<Property> {
        self.realm
            .properties
            .borrow()
            .get(self.node)
            .and_then(|cells| cells.get(name).cloned())
    }

    pub fn property(&self, name: &str) -> Option<Value> {
        self.existing_cell(name).and_then(|cell| cell.get())
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.existing_cell(name).is_some()
    }

    pub fn set_property(&self, name: &str, value: impl Into<Value>) {
        self.property_cell(name).set(Some(value.into()));
    }

    /// Reset the property to undefined. The cell and its subscribers stay.
    pub fn delete_property(&self, name: &str) {
        if let Some(cell) = self.existing_cell(name) {
            cell.set(None);
        }
    }

    // -- events -----------------------------------------------------------

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

    /// Deliver `event` synchronously. Bubbling events continue through the
    /// ancestors up to the tree or shadow root.
    pub fn dispatch_event(&self, event: &Event) {
        self.realm.dispatch(self.node, event);
    }

    // -- observation ------------------------------------------------------

    /// Register an attribute handler; it receives the re-read current value.
    /// `None` for a stale handle.
    pub fn observe_attribute(&self, name: &str, handler: impl Fn(Option<&str>) + 'static) -> Option<HandlerId> {
        let mut observers = self.realm.observers.borrow_mut();
        let observer = observers.entry(self.node)?.or_default();
        Some(observer.add_attribute(name, Rc::new(handler)))
    }

    /// Register a content handler; it receives this node's text content.
    pub fn observe_content(&self, handler: impl Fn(&str) + 'static) -> Option<HandlerId> {
        let mut observers = self.realm.observers.borrow_mut();
        let observer = observers.entry(self.node)?.or_default();
        Some(observer.add_content(Rc::new(handler)))
    }

    pub fn unobserve_attribute(&self, name: &str, id: HandlerId) -> bool {
        self.realm
            .observers
            .borrow_mut()
            .get_mut(self.node)
            .is_some_and(|observer| observer.remove_attribute(name, id))
    }

    pub fn unobserve_content(&self, id: HandlerId) -> bool {
        self.realm
            .observers
            .borrow_mut()
            .get_mut(self.node)
            .is_some_and(|observer| observer.remove_content(id))
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.realm, &other.realm) && self.node == other.node
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag_name())
            .field("node", &self.node)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use super::*;

    fn doc() -> Document {
        Document::new()
    }

    #[test]
    fn attributes_lowercase_names() {
        let doc = doc();
        let el = doc.create_element("div");
        el.set_attribute("Data-X", "1");
        assert_eq!(el.get_attribute("data-x").as_deref(), Some("1"));
        assert!(el.has_attribute("DATA-X"));
        el.remove_attribute("data-x");
        assert!(!el.has_attribute("data-x"));
    }

    #[test]
    fn attribute_observers_see_current_value() {
        let doc = doc();
        let el = doc.create_element("div");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        el.observe_attribute("x", move |value: Option<&str>| {
            log.borrow_mut().push(value.map(str::to_owned));
        });
        el.set_attribute("x", "a");
        el.set_attribute("x", "a");
        el.remove_attribute("x");
        el.remove_attribute("x");
        el.set_attribute("y", "ignored");
        assert_eq!(
            *seen.borrow(),
            vec![Some("a".to_owned()), Some("a".to_owned()), None]
        );
    }

    #[test]
    fn text_content_replaces_children() {
        let doc = doc();
        let el = doc.create_element("p");
        el.append_html("<b>bold</b> tail");
        assert_eq!(el.text_content(), "bold tail");
        let bold = el.query_selector("b").unwrap().unwrap();
        el.set_text_content("plain");
        assert_eq!(el.inner_html(), "plain");
        assert_eq!(bold.parent(), None);
        assert_eq!(bold.text_content(), "bold");
        el.set_text_content("");
        assert!(el.children().is_empty());
    }

    #[test]
    fn content_changes_reach_ancestors() {
        let doc = doc();
        let outer = doc.create_element("div");
        outer.append_html("<p><span>a</span></p>");
        let span = outer.query_selector("span").unwrap().unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        outer.observe_content(move |text: &str| log.borrow_mut().push(text.to_owned()));
        span.set_text_content("b");
        assert_eq!(*seen.borrow(), vec!["b".to_owned()]);
    }

    #[test]
    fn content_changes_stop_at_shadow_root() {
        let doc = doc();
        let host = doc.create_element("div");
        let root = host.attach_shadow();
        root.append_html("<span>in</span>");
        let seen = Rc::new(RefCell::new(0));
        let count = seen.clone();
        host.observe_content(move |_: &str| *count.borrow_mut() += 1);
        let span = root.query_selector("span").unwrap().unwrap();
        span.set_text_content("changed");
        assert_eq!(*seen.borrow(), 0);
        assert_eq!(host.text_content(), "");
        assert_eq!(root.host(), Some(host));
    }

    #[test]
    fn append_child_moves_nodes() {
        let doc = doc();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");
        a.append_child(&child);
        assert_eq!(a.children().len(), 1);
        b.append_child(&child);
        assert!(a.children().is_empty());
        assert_eq!(child.parent(), Some(b.clone()));
        assert!(!child.is_connected());
        doc.body().append_child(&b);
        assert!(child.is_connected());
    }

    #[test]
    fn append_child_ignores_cycles() {
        let doc = doc();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        outer.append_child(&inner);
        inner.append_child(&outer);
        assert_eq!(outer.parent(), None);
        assert_eq!(inner.parent(), Some(outer));
    }

    #[test]
    fn inner_html_round_trip() {
        let doc = doc();
        let el = doc.create_element("div");
        el.set_inner_html("<p class=\"x\">a &amp; b</p><br>");
        assert_eq!(el.inner_html(), "<p class=\"x\">a &amp; b</p><br>");
        el.set_inner_html("<i>new</i>");
        assert_eq!(el.outer_html(), "<div><i>new</i></div>");
    }

    #[test]
    fn properties_are_cells() {
        let doc = doc();
        let el = doc.create_element("div");
        assert!(!el.has_property("count"));
        el.set_property("count", 3);
        assert_eq!(el.property("count"), Some(Value::from(3)));
        let cell = el.property_cell("count");
        assert!(cell.ptr_eq(&el.property_cell("count")));
        el.delete_property("count");
        assert!(el.has_property("count"));
        assert_eq!(el.property("count"), None);
    }

    #[test]
    fn events_bubble_to_shadow_root_only() {
        let doc = doc();
        let host = doc.create_element("div");
        doc.body().append_child(&host);
        let root = host.attach_shadow();
        root.append_html("<p><button>go</button></p>");
        let button = root.query_selector("button").unwrap().unwrap();
        let paragraph = root.query_selector("p").unwrap().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for (label, target) in [("p", &paragraph), ("root", &root), ("host", &host)] {
            let log = seen.clone();
            target.add_event_listener("click", move |_| {
                log.borrow_mut().push(label);
                Ok(())
            });
        }
        button.dispatch_event(&Event::new("click").bubbling());
        button.dispatch_event(&Event::new("click"));
        assert_eq!(*seen.borrow(), vec!["p", "root"]);
    }

    #[test]
    fn inline_style() {
        let doc = doc();
        let el = doc.create_element("div");
        el.set_style("background-image", "url('x')");
        assert_eq!(el.style("background-image").as_deref(), Some("url('x')"));
        assert_eq!(el.outer_html(), "<div style=\"background-image: url('x');\"></div>");
    }

    #[test]
    fn weak_handles() {
        let doc = doc();
        let el = doc.create_element("div");
        let weak = el.downgrade();
        assert_eq!(weak.upgrade(), Some(el));
        drop(doc);
    }
}
