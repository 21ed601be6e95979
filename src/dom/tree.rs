//! Tree operations: insert, detach, remove, reparent, walk, shadow links.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{NodeData, NodeId, NodeKind};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The node arena shared by every document of a realm.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// Shadow roots are tree roots of their own: they have no parent, only a host
/// link, so selector matching and ancestor walks stop at the shadow boundary.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    shadow: SecondaryMap<NodeId, NodeId>,
    host: SecondaryMap<NodeId, NodeId>,
}

impl Dom {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            shadow: SecondaryMap::new(),
            host: SecondaryMap::new(),
        }
    }

    /// Insert a detached node (no parent).
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Insert a node as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics (debug) if `parent` does not exist in the tree.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        debug_assert!(
            self.nodes.contains_key(parent),
            "parent node does not exist"
        );
        let id = self.insert(data);
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
        }
        id
    }

    /// Detach a node from its parent, keeping its subtree intact.
    ///
    /// Returns the former parent.
    pub fn detach(&mut self, node: NodeId) -> Option<NodeId> {
        let old_parent = self.parent.remove(node)?;
        if let Some(siblings) = self.children.get_mut(old_parent) {
            siblings.retain(|&child| child != node);
        }
        Some(old_parent)
    }

    /// Move `node` to become the last child of `new_parent`.
    ///
    /// The node keeps its subtree intact. If `node` was previously a child of
    /// another parent, it is detached first.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) {
        if !self.nodes.contains_key(node) || !self.nodes.contains_key(new_parent) {
            return;
        }
        self.detach(node);
        self.parent.insert(node, new_parent);
        if let Some(siblings) = self.children.get_mut(new_parent) {
            siblings.push(node);
        }
    }

    /// Remove a node and all its descendants, including attached shadow trees.
    ///
    /// Returns every removed id, starting with `id`. Empty if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(id) {
            return Vec::new();
        }

        self.detach(id);
        if let Some(host) = self.host.remove(id) {
            self.shadow.remove(host);
        }

        let mut removed = Vec::new();
        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            if let Some(shadow) = self.shadow.remove(current) {
                self.host.remove(shadow);
                to_remove.push_back(shadow);
            }
            self.parent.remove(current);
            if self.nodes.remove(current).is_some() {
                removed.push(current);
            }
        }

        removed
    }

    /// Remove every child of `id`. Returns all removed ids.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let kids = self.children(id).to_vec();
        kids.into_iter().flat_map(|child| self.remove(child)).collect()
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to its tree root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent. The walk stops at shadow roots.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Attach a shadow root to `host`, or return the existing one.
    pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
        if let Some(existing) = self.shadow.get(host) {
            return *existing;
        }
        let owner = self.nodes.get(host).and_then(|data| data.owner);
        let root = self.insert(NodeData::shadow_root().with_owner(owner));
        self.shadow.insert(host, root);
        self.host.insert(root, host);
        root
    }

    /// The shadow root attached to `host`.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.shadow.get(host).copied()
    }

    /// The host of a shadow root.
    pub fn host(&self, shadow: NodeId) -> Option<NodeId> {
        self.host.get(shadow).copied()
    }

    /// Whether the node is reachable from a document, hopping from shadow
    /// roots to their hosts.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            match self.nodes.get(current).map(|data| data.kind) {
                Some(NodeKind::Document) => return true,
                None => return false,
                _ => {}
            }
            current = match self.parent(current).or_else(|| self.host(current)) {
                Some(next) => next,
                None => return false,
            };
        }
    }

    /// Concatenated text of all descendant text nodes (shadow trees excluded).
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(data) = self.nodes.get(id) else {
            return String::new();
        };
        match data.kind {
            NodeKind::Text | NodeKind::Comment => data.text.clone(),
            _ => self
                .walk_depth_first(id)
                .into_iter()
                .filter_map(|node| self.nodes.get(node))
                .filter(|node| node.kind == NodeKind::Text)
                .map(|node| node.text.as_str())
                .collect(),
        }
    }

    /// Owning document of a node.
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        let data = self.nodes.get(id)?;
        match data.kind {
            NodeKind::Document => Some(id),
            _ => data.owner,
        }
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the arena contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`, staying in the
    /// light tree.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Pre-order traversal that also descends into attached shadow trees
    /// (shadow root visited before the host's light children).
    pub fn walk_composed(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
            if let Some(shadow) = self.shadow_root(current) {
                stack.push(shadow);
            }
        }
        result
    }

    /// Set the owner document of `start` and everything composed beneath it.
    pub fn set_owner(&mut self, start: NodeId, owner: NodeId) {
        for node in self.walk_composed(start) {
            if let Some(data) = self.nodes.get_mut(node) {
                if data.kind != NodeKind::Document {
                    data.owner = Some(owner);
                }
            }
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("main").with_id("root"));
        let a = dom.insert_child(root, NodeData::element("section").with_id("a").with_class("left"));
        let b = dom.insert_child(root, NodeData::element("section").with_id("b").with_class("right"));
        let c = dom.insert_child(a, NodeData::element("button").with_id("c"));
        let d = dom.insert_child(a, NodeData::element("label").with_id("d"));
        (dom, root, a, b, c, d)
    }

    #[test]
    fn insert_child_parent_relationship() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.parent(a), Some(root));
        assert_eq!(dom.parent(c), Some(a));
        assert_eq!(dom.parent(root), None);
    }

    #[test]
    fn children_list() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.children(root), &[a, b]);
        assert_eq!(dom.children(a), &[c, d]);
        assert!(dom.children(c).is_empty());
    }

    #[test]
    fn ancestors() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.ancestors(c), vec![a, root]);
        assert!(dom.ancestors(root).is_empty());
    }

    #[test]
    fn remove_subtree_returns_ids() {
        let (mut dom, root, a, b, c, d) = build_tree();
        let removed = dom.remove(a);
        assert_eq!(removed, vec![a, c, d]);
        assert!(dom.contains(root));
        assert!(dom.contains(b));
        assert_eq!(dom.children(root), &[b]);
        assert_eq!(dom.len(), 2);
    }

    #[test]
    fn remove_nonexistent() {
        let mut dom = Dom::new();
        let id = dom.insert(NodeData::element("x"));
        dom.remove(id);
        assert!(dom.remove(id).is_empty());
    }

    #[test]
    fn reparent() {
        let (mut dom, root, a, b, c, _d) = build_tree();
        dom.reparent(c, b);
        assert_eq!(dom.parent(c), Some(b));
        assert!(!dom.children(a).contains(&c));
        assert_eq!(dom.ancestors(c), vec![b, root]);
    }

    #[test]
    fn detach_keeps_subtree() {
        let (mut dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.detach(a), Some(root));
        assert_eq!(dom.parent(a), None);
        assert_eq!(dom.parent(c), Some(a));
        assert_eq!(dom.detach(a), None);
    }

    #[test]
    fn walk_depth_first() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.walk_depth_first(root), vec![root, a, c, d, b]);
    }

    #[test]
    fn shadow_roots_are_isolated() {
        let (mut dom, root, a, _b, _c, _d) = build_tree();
        let shadow = dom.attach_shadow(a);
        assert_eq!(dom.attach_shadow(a), shadow);
        let inner = dom.insert_child(shadow, NodeData::element("span"));

        assert_eq!(dom.shadow_root(a), Some(shadow));
        assert_eq!(dom.host(shadow), Some(a));
        assert!(dom.ancestors(inner) == vec![shadow]);
        assert!(!dom.walk_depth_first(root).contains(&inner));
        assert!(dom.walk_composed(root).contains(&inner));
    }

    #[test]
    fn remove_drops_shadow_tree() {
        let (mut dom, _root, a, _b, _c, _d) = build_tree();
        let shadow = dom.attach_shadow(a);
        let inner = dom.insert_child(shadow, NodeData::element("span"));
        let removed = dom.remove(a);
        assert!(removed.contains(&shadow));
        assert!(removed.contains(&inner));
        assert!(!dom.contains(inner));
    }

    #[test]
    fn connectedness_crosses_shadow_boundary() {
        let mut dom = Dom::new();
        let doc = dom.insert(NodeData::document());
        let host = dom.insert_child(doc, NodeData::element("x-card"));
        let shadow = dom.attach_shadow(host);
        let inner = dom.insert_child(shadow, NodeData::element("b"));
        let loose = dom.insert(NodeData::element("div"));

        assert!(dom.is_connected(inner));
        assert!(!dom.is_connected(loose));
        dom.detach(host);
        assert!(!dom.is_connected(inner));
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let mut dom = Dom::new();
        let p = dom.insert(NodeData::element("p"));
        dom.insert_child(p, NodeData::text("Hello, "));
        let b = dom.insert_child(p, NodeData::element("b"));
        dom.insert_child(b, NodeData::text("world"));
        dom.insert_child(p, NodeData::comment("ignored"));
        assert_eq!(dom.text_content(p), "Hello, world");
    }

    #[test]
    fn set_owner_covers_shadow_trees() {
        let mut dom = Dom::new();
        let doc = dom.insert(NodeData::document());
        let host = dom.insert(NodeData::element("x-card"));
        let shadow = dom.attach_shadow(host);
        let inner = dom.insert_child(shadow, NodeData::element("b"));
        dom.set_owner(host, doc);
        assert_eq!(dom.owner(inner), Some(doc));
        assert_eq!(dom.owner(doc), Some(doc));
    }

    #[test]
    fn default_impl() {
        let dom = Dom::default();
        assert!(dom.is_empty());
    }
}
