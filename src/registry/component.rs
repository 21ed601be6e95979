//! Registry entries.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::context::{Definition, DefinitionContext};
use crate::element::ElementClass;

/// A tracked component. Clones share state.
#[derive(Clone)]
pub struct Component(Rc<Inner>);

struct Inner {
    name: String,
    origin: String,
    definition: Definition,
    class: RefCell<Option<Rc<ElementClass>>>,
}

impl Component {
    pub(crate) fn new(name: &str, origin: &str, definition: Definition) -> Self {
        Self(Rc::new(Inner {
            name: name.to_owned(),
            origin: origin.to_owned(),
            definition,
            class: RefCell::new(None),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Base URL the component's relative resources resolve against.
    pub fn origin(&self) -> &str {
        &self.0.origin
    }

    /// Whether the class has been generated and registered.
    pub fn is_defined(&self) -> bool {
        self.0.class.borrow().is_some()
    }

    pub fn element_class(&self) -> Option<Rc<ElementClass>> {
        self.0.class.borrow().clone()
    }

    /// The accumulated context; includes inherited entries once defined.
    pub fn context(&self) -> Ref<'_, DefinitionContext> {
        self.0.definition.context()
    }

    pub(crate) fn definition(&self) -> &Definition {
        &self.0.definition
    }

    pub(crate) fn set_class(&self, class: Rc<ElementClass>) {
        *self.0.class.borrow_mut() = Some(class);
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.0.name)
            .field("origin", &self.0.origin)
            .field("defined", &self.is_defined())
            .finish()
    }
}
