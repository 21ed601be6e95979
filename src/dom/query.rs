//! DOM queries: scoped selector matching, by id, by tag, generic predicate.

use super::node::{NodeData, NodeId};
use super::selector::SelectorList;
use super::tree::Dom;

impl Dom {
    /// All elements beneath `scope` (excluding `scope` itself) that match
    /// `selectors`, in tree order. Shadow trees are not entered.
    pub fn query_selector_all(&self, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.walk_depth_first(scope)
            .into_iter()
            .skip(1)
            .filter(|&node| selectors.matches(node, self))
            .collect()
    }

    /// The first element beneath `scope` matching `selectors`.
    pub fn query_selector(&self, scope: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        self.walk_depth_first(scope)
            .into_iter()
            .skip(1)
            .find(|&node| selectors.matches(node, self))
    }

    /// Find the first node in the light tree under `scope` whose `id`
    /// attribute matches.
    pub fn query_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.query_all(scope, |data| data.id() == Some(id))
            .into_iter()
            .next()
    }

    /// Find all elements under `scope` with the given tag.
    pub fn query_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.query_all(scope, |data| data.is_element() && data.tag == tag)
    }

    /// Find all nodes under `scope` (inclusive) matching an arbitrary
    /// predicate, in tree order.
    pub fn query_all(&self, scope: NodeId, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.walk_depth_first(scope)
            .into_iter()
            .filter(|&node| self.get(node).is_some_and(&predicate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::node::{NodeData, NodeId};
    use crate::dom::selector::parse_selector_list;
    use crate::dom::tree::Dom;

    /// Build a test tree for queries:
    /// ```text
    ///       root (main #root)
    ///      /    \
    ///    a       b
    ///  (section  (section
    ///   #sidebar  #main
    ///   .nav)     .content)
    ///   / \
    ///  c   d
    /// (button  (button
    ///  #save    #cancel
    ///  .primary .danger
    ///  .btn)    .btn)
    /// ```
    fn build_query_tree() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::element("main").with_id("root"));
        let a = dom.insert_child(
            root,
            NodeData::element("section")
                .with_id("sidebar")
                .with_class("nav"),
        );
        let _b = dom.insert_child(
            root,
            NodeData::element("section")
                .with_id("main")
                .with_class("content"),
        );
        let _c = dom.insert_child(
            a,
            NodeData::element("button")
                .with_id("save")
                .with_class("primary")
                .with_class("btn"),
        );
        let _d = dom.insert_child(
            a,
            NodeData::element("button")
                .with_id("cancel")
                .with_class("danger")
                .with_class("btn"),
        );
        (dom, root)
    }

    #[test]
    fn query_selector_all_tree_order() {
        let (dom, root) = build_query_tree();
        let list = parse_selector_list(".btn").unwrap();
        let ids: Vec<_> = dom
            .query_selector_all(root, &list)
            .into_iter()
            .map(|n| dom.get(n).unwrap().id().unwrap().to_owned())
            .collect();
        assert_eq!(ids, vec!["save", "cancel"]);
    }

    #[test]
    fn query_selector_excludes_scope() {
        let (dom, root) = build_query_tree();
        let list = parse_selector_list("main").unwrap();
        assert!(dom.query_selector(root, &list).is_none());
    }

    #[test]
    fn query_selector_first_match() {
        let (dom, root) = build_query_tree();
        let list = parse_selector_list("section").unwrap();
        let first = dom.query_selector(root, &list).unwrap();
        assert_eq!(dom.get(first).unwrap().id(), Some("sidebar"));
    }

    #[test]
    fn query_skips_shadow_trees() {
        let (mut dom, root) = build_query_tree();
        let shadow = dom.attach_shadow(root);
        dom.insert_child(shadow, NodeData::element("button").with_class("btn"));
        let list = parse_selector_list("button").unwrap();
        assert_eq!(dom.query_selector_all(root, &list).len(), 2);
        assert_eq!(dom.query_selector_all(shadow, &list).len(), 1);
    }

    #[test]
    fn query_by_id_found() {
        let (dom, root) = build_query_tree();
        let id = dom.query_by_id(root, "sidebar").unwrap();
        assert_eq!(dom.get(id).unwrap().tag, "section");
        assert!(dom.query_by_id(root, "nonexistent").is_none());
    }

    #[test]
    fn query_by_tag() {
        let (dom, root) = build_query_tree();
        assert_eq!(dom.query_by_tag(root, "BUTTON").len(), 2);
        assert_eq!(dom.query_by_tag(root, "section").len(), 2);
        assert!(dom.query_by_tag(root, "slider").is_empty());
    }

    #[test]
    fn query_all_custom_predicate() {
        let (dom, root) = build_query_tree();
        // Find all nodes that have an id starting with "s".
        let results = dom.query_all(root, |data| data.id().is_some_and(|id| id.starts_with('s')));
        // "sidebar" and "save"
        assert_eq!(results.len(), 2);
    }
}
