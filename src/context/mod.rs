//! Definition contexts: what a definition function declares, the directive
//! handle that records it, and `from` inheritance.

pub mod binding;
pub mod definition;
pub mod directives;
mod inherit;

pub use binding::{Binding, BindingEnd, Sigil, ROOT};
pub use definition::{
    Asset, AssetOptions, AttributeDef, AttributeListener, DefinitionContext, EventHandler, Fragment, InitListener,
    LifecycleListener, PropertyDef, PropertyListener, ResourceOptions, ValueOptions,
};
pub use directives::Definition;
