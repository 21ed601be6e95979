//! `from` inheritance: merge a parent context underneath a child.

use super::definition::DefinitionContext;

impl DefinitionContext {
    /// Merge `parent` underneath `self`.
    ///
    /// Sequences concatenate parent-then-child. Attribute and property
    /// entries merge per name: the child's initial value wins when present,
    /// transform and change lists concatenate. Bindings merge by composite
    /// key with the child overwriting. Identity fields (`name`, `origin`,
    /// `from`) and aliases stay the child's own.
    pub fn inherit(&mut self, parent: &DefinitionContext) {
        self.html = concat(&parent.html, &self.html);
        self.css = concat(&parent.css, &self.css);
        self.assets = concat(&parent.assets, &self.assets);

        let mut attributes = parent.attributes.clone();
        for (name, child) in std::mem::take(&mut self.attributes) {
            let entry = attributes.entry(name).or_default();
            if child.initial.is_some() {
                entry.initial = child.initial;
            }
            entry.transforms.extend(child.transforms);
        }
        self.attributes = attributes;

        let mut properties = parent.properties.clone();
        for (name, child) in std::mem::take(&mut self.properties) {
            let entry = properties.entry(name).or_default();
            if child.initial.is_some() {
                entry.initial = child.initial;
            }
            entry.transforms.extend(child.transforms);
            entry.changes.extend(child.changes);
            entry.declared |= child.declared;
        }
        self.properties = properties;

        let mut bindings = parent.bindings.clone();
        bindings.extend(std::mem::take(&mut self.bindings));
        self.bindings = bindings;

        let lifecycle = &mut self.lifecycle;
        lifecycle.init = concat(&parent.lifecycle.init, &lifecycle.init);
        lifecycle.create = concat(&parent.lifecycle.create, &lifecycle.create);
        lifecycle.add = concat(&parent.lifecycle.add, &lifecycle.add);
        lifecycle.remove = concat(&parent.lifecycle.remove, &lifecycle.remove);
        lifecycle.adopt = concat(&parent.lifecycle.adopt, &lifecycle.adopt);
        let mut attribute = parent.lifecycle.attribute.clone();
        for (name, listeners) in std::mem::take(&mut lifecycle.attribute) {
            attribute.entry(name).or_default().extend(listeners);
        }
        lifecycle.attribute = attribute;

        self.events = concat(&parent.events, &self.events);
        self.events_at = concat(&parent.events_at, &self.events_at);

        let mut observed = parent.observed.clone();
        observed.extend(std::mem::take(&mut self.observed));
        self.observed = observed;
    }
}

fn concat<T: Clone>(first: &[T], second: &[T]) -> Vec<T> {
    first.iter().chain(second).cloned().collect()
}
