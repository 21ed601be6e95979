//! Read-only view over defined components.

use std::rc::Rc;

use super::component::Component;
use super::RegistryState;

/// Live view: membership and enumeration only ever show components that
/// are defined at the time of the call.
#[derive(Clone)]
pub struct ComponentsView {
    state: Rc<RegistryState>,
}

impl ComponentsView {
    pub(crate) fn new(state: Rc<RegistryState>) -> Self {
        Self { state }
    }

    fn defined(&self) -> Vec<Component> {
        self.state
            .components
            .borrow()
            .values()
            .filter(|component| component.is_defined())
            .cloned()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Component> {
        self.state
            .components
            .borrow()
            .get(name)
            .filter(|component| component.is_defined())
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.defined()
            .iter()
            .map(|component| component.name().to_owned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.defined().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the defined components in definition order.
    pub fn iter(&self) -> impl Iterator<Item = Component> {
        self.defined().into_iter()
    }
}

impl std::fmt::Debug for ComponentsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
