//! The definition context: everything a definition function declares.
//!
//! Directive calls only ever append to a context. Resource-backed entries
//! (html, css, assets) reserve their slot at call time and are filled when
//! the matching pending future settles, so declaration order survives
//! out-of-order network completion.

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use indexmap::{IndexMap, IndexSet};

use super::binding::Binding;
use crate::dom::Element;
use crate::element::ElementClass;
use crate::error::{ListenerResult, Result};
use crate::event::Event;
use crate::value::{Transform, Value};

// ---------------------------------------------------------------------------
// Listener types
// ---------------------------------------------------------------------------

/// `(element, content)` lifecycle listener.
pub type LifecycleListener = Rc<dyn Fn(&Element, &Element) -> ListenerResult>;

/// `(old, new, element, content)` attribute listener.
pub type AttributeListener = Rc<dyn Fn(Option<&str>, Option<&str>, &Element, &Element) -> ListenerResult>;

/// `(old, new, element, content)` property listener.
pub type PropertyListener = Rc<dyn Fn(Option<&Value>, Option<&Value>, &Element, &Element) -> ListenerResult>;

/// `(event, element, content)` event handler.
pub type EventHandler = Rc<dyn Fn(&Event, &Element, &Element) -> ListenerResult>;

/// Runs once when the generated class is registered.
pub type InitListener = Rc<dyn Fn(&ElementClass) -> ListenerResult>;

/// A deferred piece of definition work (a resource fetch or a parent wait).
pub type PendingWork = LocalBoxFuture<'static, Result<()>>;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Options for `html_with` / `css_with`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Discard markup accumulated by earlier calls before appending this one.
    pub overwrite: bool,
    /// Treat the argument as literal content; never probe the network.
    pub no_remote: bool,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn no_remote(mut self) -> Self {
        self.no_remote = true;
        self
    }
}

/// Options for `asset_with`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetOptions {
    /// Attribute receiving the data URI. Defaults to `src`, or an inline
    /// `background-image` for images on non-`img` elements.
    pub attribute: Option<String>,
}

impl AssetOptions {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            attribute: Some(name.into()),
        }
    }
}

/// Options for `attribute_with` / `property_with`.
#[derive(Clone, Default)]
pub struct ValueOptions {
    pub initial: Option<Value>,
    pub transform: Option<Transform>,
}

impl ValueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(mut self, initial: impl Into<Value>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

impl fmt::Debug for ValueOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOptions")
            .field("initial", &self.initial)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// A resolved html or css fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub template: String,
    pub overwrite: bool,
}

/// A resolved asset directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub selector: String,
    /// Base64 payload.
    pub data: String,
    pub content_type: String,
    pub attribute: Option<String>,
}

impl Asset {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.data)
    }
}

#[derive(Clone, Default)]
pub struct AttributeDef {
    pub initial: Option<Value>,
    /// Inheritance order: parent transforms first.
    pub transforms: Vec<Transform>,
}

#[derive(Clone, Default)]
pub struct PropertyDef {
    pub initial: Option<Value>,
    pub transforms: Vec<Transform>,
    pub changes: Vec<PropertyListener>,
    /// `false` for entries created implicitly by `on_property`.
    pub declared: bool,
}

#[derive(Clone, Default)]
pub struct Lifecycle {
    pub init: Vec<InitListener>,
    pub create: Vec<LifecycleListener>,
    pub add: Vec<LifecycleListener>,
    pub remove: Vec<LifecycleListener>,
    pub adopt: Vec<LifecycleListener>,
    pub attribute: IndexMap<String, Vec<AttributeListener>>,
}

#[derive(Clone)]
pub struct EventDef {
    pub event: String,
    pub listener: EventHandler,
}

#[derive(Clone)]
pub struct EventAtDef {
    pub selector: String,
    pub event: String,
    pub listener: EventHandler,
}

// ---------------------------------------------------------------------------
// DefinitionContext
// ---------------------------------------------------------------------------

/// Accumulated declarations for one component.
#[derive(Default)]
pub struct DefinitionContext {
    pub name: String,
    pub origin: String,
    pub from: Option<String>,
    pub aliases: IndexSet<String>,
    pub html: Vec<Option<Fragment>>,
    pub css: Vec<Option<Fragment>>,
    pub assets: Vec<Option<Asset>>,
    pub attributes: IndexMap<String, AttributeDef>,
    pub properties: IndexMap<String, PropertyDef>,
    pub bindings: IndexMap<String, Binding>,
    pub lifecycle: Lifecycle,
    pub events: Vec<EventDef>,
    pub events_at: Vec<EventAtDef>,
    pub observed: IndexSet<String>,
    pub(crate) pending: Vec<PendingWork>,
}

impl DefinitionContext {
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Resolved html fragments in declaration order.
    pub fn html_fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.html.iter().flatten()
    }

    /// Resolved css fragments in declaration order.
    pub fn css_fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.css.iter().flatten()
    }

    /// Resolved assets in declaration order. Assets whose resource was
    /// missing are skipped.
    pub fn resolved_assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().flatten()
    }

    /// Number of unsettled pending futures.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// A copy of every field except the pending futures.
    pub fn snapshot(&self) -> Self {
        Self {
            name: self.name.clone(),
            origin: self.origin.clone(),
            from: self.from.clone(),
            aliases: self.aliases.clone(),
            html: self.html.clone(),
            css: self.css.clone(),
            assets: self.assets.clone(),
            attributes: self.attributes.clone(),
            properties: self.properties.clone(),
            bindings: self.bindings.clone(),
            lifecycle: self.lifecycle.clone(),
            events: self.events.clone(),
            events_at: self.events_at.clone(),
            observed: self.observed.clone(),
            pending: Vec::new(),
        }
    }
}

impl fmt::Debug for DefinitionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionContext")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("from", &self.from)
            .field("aliases", &self.aliases)
            .field("html", &self.html)
            .field("css", &self.css)
            .field("assets", &self.assets.len())
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("events", &self.events.len())
            .field("events_at", &self.events_at.len())
            .field("observed", &self.observed)
            .field("pending", &self.pending.len())
            .finish()
    }
}
