//! Binding resolution: watch a source endpoint, propagate to targets.

use std::rc::Rc;

use crate::context::binding::{Binding, BindingEnd, Sigil};
use crate::dom::{parse_selector_list, Element, WeakElement};
use crate::value::{Transform, Value};

/// Resolve `binding` inside one instance and start propagating.
///
/// The source is the first element matching its selector, the targets are
/// every element matching theirs (`.` is the root element). The current
/// source value is pushed immediately, then on every change.
pub(crate) fn connect(binding: &Binding, element: &Element, content: &Element) {
    let key = binding.key();
    let Some(source) = resolve(&binding.source, element, content).into_iter().next() else {
        tracing::warn!(binding = %key, "binding source matched nothing");
        return;
    };
    let targets = resolve(&binding.target, element, content);
    if targets.is_empty() {
        tracing::warn!(binding = %key, "binding target matched nothing");
        return;
    }
    let propagator = Rc::new(Propagator {
        targets: targets.iter().map(Element::downgrade).collect(),
        sigil: binding.target.name.clone(),
        transform: binding.transform.clone(),
    });

    match &binding.source.name {
        Sigil::Attribute(name) => {
            if let Some(value) = source.get_attribute(name) {
                propagator.push(Some(Value::from(value)));
            }
            let propagator = propagator.clone();
            source.observe_attribute(name, move |value| propagator.push(value.map(Value::from)));
        }
        Sigil::Property(name) => {
            let cell = source.property_cell(name);
            if let Some(value) = cell.get() {
                propagator.push(Some(value));
            }
            let propagator = propagator.clone();
            cell.subscribe(move |_, new| propagator.push(new.cloned()));
        }
        Sigil::Content => {
            propagator.push(Some(Value::from(source.text_content())));
            let propagator = propagator.clone();
            source.observe_content(move |text| propagator.push(Some(Value::from(text))));
        }
    }
    tracing::debug!(binding = %key, targets = targets.len(), "binding connected");
}

fn resolve(end: &BindingEnd, element: &Element, content: &Element) -> Vec<Element> {
    if end.is_root() {
        return vec![element.clone()];
    }
    match parse_selector_list(&end.element) {
        Ok(selectors) => content.query_list(&selectors),
        Err(err) => {
            tracing::warn!(selector = %end.element, error = %err, "invalid binding selector");
            Vec::new()
        }
    }
}

struct Propagator {
    targets: Vec<WeakElement>,
    sigil: Sigil,
    transform: Option<Transform>,
}

impl Propagator {
    fn push(&self, value: Option<Value>) {
        let value = match &self.transform {
            Some(transform) => transform(value),
            None => value,
        };
        for target in self.targets.iter().filter_map(WeakElement::upgrade) {
            match &self.sigil {
                Sigil::Attribute(name) => match &value {
                    None => target.remove_attribute(name),
                    Some(value) => {
                        let text = value.to_string();
                        if target.get_attribute(name).as_deref() != Some(text.as_str()) {
                            target.set_attribute(name, &text);
                        }
                    }
                },
                Sigil::Property(name) => match &value {
                    None => target.delete_property(name),
                    Some(value) => target.set_property(name, value.clone()),
                },
                Sigil::Content => {
                    let text = match &value {
                        None | Some(Value::Null) => String::new(),
                        Some(value) => value.to_string(),
                    };
                    if target.text_content() != text {
                        target.set_text_content(&text);
                    }
                }
            }
        }
    }
}
