//! Node types: NodeId, NodeKind, NodeData.

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What a node represents in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
    /// Isolated content root attached to a host element.
    ShadowRoot,
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Lowercase tag for elements, `#text`, `#comment`, `#document` or
    /// `#shadow-root` otherwise.
    pub tag: String,
    /// Attributes in insertion order.
    pub attributes: Vec<(String, String)>,
    /// Payload of text and comment nodes.
    pub text: String,
    /// Inline style declarations in insertion order.
    pub style: Vec<(String, String)>,
    /// Owning document node.
    pub owner: Option<NodeId>,
}

impl NodeData {
    fn with_kind(kind: NodeKind, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_owned(),
            attributes: Vec::new(),
            text: String::new(),
            style: Vec::new(),
            owner: None,
        }
    }

    /// Create an element node. The tag is lowercased.
    pub fn element(tag: &str) -> Self {
        Self::with_kind(NodeKind::Element, &tag.to_ascii_lowercase())
    }

    /// Create a text node.
    pub fn text(text: impl Into<String>) -> Self {
        let mut data = Self::with_kind(NodeKind::Text, "#text");
        data.text = text.into();
        data
    }

    /// Create a comment node.
    pub fn comment(text: impl Into<String>) -> Self {
        let mut data = Self::with_kind(NodeKind::Comment, "#comment");
        data.text = text.into();
        data
    }

    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, "#document")
    }

    pub fn shadow_root() -> Self {
        Self::with_kind(NodeKind::ShadowRoot, "#shadow-root")
    }

    /// Set the owner document (builder).
    pub fn with_owner(mut self, owner: Option<NodeId>) -> Self {
        self.owner = owner;
        self
    }

    /// Set the `id` attribute (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_attribute("id", &id.into());
        self
    }

    /// Add a single CSS class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(&class.into());
        self
    }

    /// Set an attribute (builder).
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, &value.into());
        self
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Look up an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, returning the previous value.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Option<String> {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value.to_owned())),
            None => {
                self.attributes.push((name.to_owned(), value.to_owned()));
                None
            }
        }
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or("").split_whitespace()
    }

    /// Check whether this node has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a CSS class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attribute("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attribute("class", &joined);
    }

    /// Remove a CSS class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let kept: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        let joined = kept.join(" ");
        self.set_attribute("class", &joined);
    }

    /// Toggle a CSS class: add if absent, remove if present.
    pub fn toggle_class(&mut self, class: &str) {
        if self.has_class(class) {
            self.remove_class(class);
        } else {
            self.add_class(class);
        }
    }

    /// Inline style lookup by property name (`background-image`, ...).
    pub fn style(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set an inline style declaration.
    pub fn set_style(&mut self, property: &str, value: &str) {
        match self.style.iter_mut().find(|(p, _)| p == property) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => self.style.push((property.to_owned(), value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_defaults() {
        let data = NodeData::element("DIV");
        assert_eq!(data.kind, NodeKind::Element);
        assert_eq!(data.tag, "div");
        assert!(data.attributes.is_empty());
        assert!(data.owner.is_none());
    }

    #[test]
    fn builder_with_id() {
        let data = NodeData::element("label").with_id("title");
        assert_eq!(data.id(), Some("title"));
    }

    #[test]
    fn builder_with_class_dedup() {
        let data = NodeData::element("p").with_class("primary").with_class("primary");
        assert_eq!(data.attribute("class"), Some("primary"));
    }

    #[test]
    fn set_attribute_returns_previous() {
        let mut data = NodeData::element("a");
        assert_eq!(data.set_attribute("href", "/x"), None);
        assert_eq!(data.set_attribute("href", "/y"), Some("/x".to_owned()));
        assert_eq!(data.attribute("href"), Some("/y"));
    }

    #[test]
    fn remove_attribute() {
        let mut data = NodeData::element("a").with_attribute("href", "/x");
        assert_eq!(data.remove_attribute("href"), Some("/x".to_owned()));
        assert_eq!(data.remove_attribute("href"), None);
    }

    #[test]
    fn class_list_operations() {
        let mut data = NodeData::element("x").with_class("a").with_class("b");
        assert!(data.has_class("a"));
        data.remove_class("a");
        assert!(!data.has_class("a"));
        assert!(data.has_class("b"));
        data.toggle_class("c");
        assert_eq!(data.attribute("class"), Some("b c"));
        data.toggle_class("c");
        assert_eq!(data.attribute("class"), Some("b"));
    }

    #[test]
    fn inline_style() {
        let mut data = NodeData::element("div");
        data.set_style("color", "red");
        data.set_style("color", "blue");
        assert_eq!(data.style("color"), Some("blue"));
        assert_eq!(data.style.len(), 1);
    }

    #[test]
    fn node_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<NodeId>();
    }
}
