//! Mutation delivery: custom element upgrades, lifecycle callbacks and
//! observer fan-out.
//!
//! Every method here runs after the arena mutation has completed and never
//! holds a borrow while user code runs.

use std::rc::Rc;

use super::document::Realm;
use super::element::Element;
use super::node::{NodeId, NodeKind};
use crate::element::ElementClass;
use crate::observe::ContentHandler;

impl Realm {
    pub(crate) fn instance(&self, node: NodeId) -> Option<Rc<ElementClass>> {
        self.instances.borrow().get(node).cloned()
    }

    /// Construct `node` if its tag names a registered class and it has not
    /// been constructed yet.
    pub(crate) fn upgrade(self: &Rc<Self>, node: NodeId) {
        let class = {
            let dom = self.dom.borrow();
            let Some(data) = dom.get(node).filter(|data| data.is_element()) else {
                return;
            };
            let definitions = self.definitions.borrow();
            match definitions.get(&data.tag) {
                Some(class) => class.clone(),
                None => return,
            }
        };
        {
            let mut instances = self.instances.borrow_mut();
            if instances.contains_key(node) {
                return;
            }
            instances.insert(node, class.clone());
        }
        tracing::debug!(element = class.name(), "constructing custom element");
        class.construct(&Element::new(self.clone(), node));
    }

    pub(crate) fn upgrade_subtree(self: &Rc<Self>, root: NodeId) {
        let nodes = self.dom.borrow().walk_composed(root);
        for node in nodes {
            self.upgrade(node);
        }
    }

    pub(crate) fn connected_subtree(self: &Rc<Self>, root: NodeId) {
        for (node, class) in self.instances_under(root) {
            class.connected(&Element::new(self.clone(), node));
        }
    }

    pub(crate) fn disconnected_subtree(self: &Rc<Self>, root: NodeId) {
        for (node, class) in self.instances_under(root) {
            class.disconnected(&Element::new(self.clone(), node));
        }
    }

    fn instances_under(&self, root: NodeId) -> Vec<(NodeId, Rc<ElementClass>)> {
        let nodes = self.dom.borrow().walk_composed(root);
        let instances = self.instances.borrow();
        nodes
            .into_iter()
            .filter_map(|node| instances.get(node).map(|class| (node, class.clone())))
            .collect()
    }

    /// The document node `node` belongs to: itself for documents, its owner
    /// otherwise.
    pub(crate) fn document_of(&self, node: NodeId) -> Option<NodeId> {
        let dom = self.dom.borrow();
        let data = dom.get(node)?;
        match data.kind {
            NodeKind::Document => Some(node),
            _ => data.owner,
        }
    }

    /// Whether `ancestor` is `node` or one of its composed ancestors.
    pub(crate) fn contains_composed(&self, ancestor: NodeId, node: NodeId) -> bool {
        let dom = self.dom.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = dom.parent(id).or_else(|| dom.host(id));
        }
        false
    }

    /// Detach `node` from its parent, firing disconnected callbacks and a
    /// content change on the former parent.
    pub(crate) fn detach(self: &Rc<Self>, node: NodeId) {
        let (old_parent, was_connected) = {
            let mut dom = self.dom.borrow_mut();
            let connected = dom.is_connected(node);
            (dom.detach(node), connected)
        };
        let Some(parent) = old_parent else {
            return;
        };
        if was_connected {
            self.disconnected_subtree(node);
        }
        self.content_changed(parent);
    }

    /// Re-own `node`'s subtree by `document`, firing adopted callbacks when
    /// the owner actually changes.
    pub(crate) fn adopt(self: &Rc<Self>, node: NodeId, document: NodeId) {
        {
            let mut dom = self.dom.borrow_mut();
            if dom.owner(node) == Some(document) {
                return;
            }
            dom.set_owner(node, document);
        }
        for (node, class) in self.instances_under(node) {
            class.adopted(&Element::new(self.clone(), node));
        }
    }

    /// Attribute record for `node`: the class callback when the attribute is
    /// observed, then every handler registered for `name` with the re-read
    /// current value.
    pub(crate) fn attribute_changed(self: &Rc<Self>, node: NodeId, name: &str, old: Option<&str>, new: Option<&str>) {
        if let Some(class) = self.instance(node) {
            if class.observes(name) {
                class.attribute_changed(name, old, new, &Element::new(self.clone(), node));
            }
        }
        let handlers = self
            .observers
            .borrow()
            .get(node)
            .map(|observer| observer.attribute_handlers(name))
            .unwrap_or_default();
        if handlers.is_empty() {
            return;
        }
        // A handler may rewrite the attribute; later handlers see the rewrite.
        for handler in handlers {
            let current = self
                .dom
                .borrow()
                .get(node)
                .and_then(|data| data.attribute(name).map(str::to_owned));
            handler(current.as_deref());
        }
    }

    /// Child-list or character-data record at `target`: content handlers on
    /// the target and every ancestor up to the tree root each receive their
    /// own node's text content.
    pub(crate) fn content_changed(&self, target: NodeId) {
        let chain: Vec<NodeId> = {
            let dom = self.dom.borrow();
            std::iter::once(target).chain(dom.ancestors(target)).collect()
        };
        let deliveries: Vec<(NodeId, Vec<ContentHandler>)> = {
            let observers = self.observers.borrow();
            chain
                .into_iter()
                .filter_map(|node| {
                    observers
                        .get(node)
                        .filter(|observer| observer.has_content_handlers())
                        .map(|observer| (node, observer.content_handlers()))
                })
                .collect()
        };
        for (node, handlers) in deliveries {
            let text = self.dom.borrow().text_content(node);
            for handler in handlers {
                handler(&text);
            }
        }
    }
}
