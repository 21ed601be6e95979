//! Deferred per-instance setup.
//!
//! Construction only populates the shadow root. Attribute defaults, property
//! cells, create listeners, bindings and events are applied in one batch per
//! scheduler drain, covering every element constructed since the last one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::bind;
use super::class::ElementClass;
use crate::dom::document::Realm;
use crate::dom::{parse_selector_list, Element};
use crate::event::fire_immediately;
use crate::value::{apply_transforms, Transform, Value};

struct SetupEntry {
    element: Element,
    content: Element,
    class: Rc<ElementClass>,
}

#[derive(Default)]
pub(crate) struct SetupQueue {
    entries: RefCell<Vec<SetupEntry>>,
    scheduled: Cell<bool>,
}

impl SetupQueue {
    /// Queue an element. The first push since the last batch schedules one.
    pub(crate) fn push(&self, realm: &Rc<Realm>, element: Element, content: Element, class: Rc<ElementClass>) {
        self.entries.borrow_mut().push(SetupEntry {
            element,
            content,
            class,
        });
        if self.scheduled.replace(true) {
            return;
        }
        let weak = Rc::downgrade(realm);
        realm.scheduler.defer(move || {
            if let Some(realm) = weak.upgrade() {
                realm.setup.run_batch();
            }
        });
    }

    fn run_batch(&self) {
        self.scheduled.set(false);
        let batch = std::mem::take(&mut *self.entries.borrow_mut());
        tracing::debug!(count = batch.len(), "running element setup batch");
        for entry in batch {
            entry.class.setup(&entry.element, &entry.content);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl ElementClass {
    pub(crate) fn setup(&self, element: &Element, content: &Element) {
        let context = self.context();

        for (name, def) in &context.attributes {
            match element.get_attribute(name) {
                None => {
                    if let Some(value) = apply_transforms(&def.transforms, def.initial.clone()) {
                        element.set_attribute(name, &value.to_string());
                    }
                }
                Some(current) if !def.transforms.is_empty() => {
                    normalize_attribute(element, name, &def.transforms, Some(current.as_str()));
                }
                Some(_) => {}
            }
            if !def.transforms.is_empty() {
                guard_attribute(element, name, def.transforms.clone());
            }
        }

        for (name, def) in &context.properties {
            let cell = element.property_cell(name);
            for transform in &def.transforms {
                cell.compose(transform.clone());
            }
            match cell.get() {
                Some(current) => cell.set(Some(current)),
                None => {
                    if let Some(initial) = &def.initial {
                        cell.set(Some(initial.clone()));
                    }
                }
            }
            if def.changes.is_empty() {
                continue;
            }
            let listeners = def.changes.clone();
            let label = self.label(&format!("property {name}"));
            let weak_element = element.downgrade();
            let weak_content = content.downgrade();
            cell.subscribe(move |old, new| {
                let (Some(element), Some(content)) = (weak_element.upgrade(), weak_content.upgrade()) else {
                    return;
                };
                fire_immediately(&label, &listeners, |listener| listener(old, new, &element, &content));
            });
        }

        fire_immediately(&self.label("create"), &context.lifecycle.create, |listener| {
            listener(element, content)
        });

        for binding in context.bindings.values() {
            bind::connect(binding, element, content);
        }

        for def in &context.events {
            let handler = def.listener.clone();
            let (weak_element, weak_content) = (element.downgrade(), content.downgrade());
            element.add_event_listener(&def.event, move |event| {
                match (weak_element.upgrade(), weak_content.upgrade()) {
                    (Some(element), Some(content)) => handler(event, &element, &content),
                    _ => Ok(()),
                }
            });
        }

        for def in &context.events_at {
            let targets = match parse_selector_list(&def.selector) {
                Ok(selectors) => content.query_list(&selectors),
                Err(err) => {
                    tracing::warn!(selector = %def.selector, error = %err, "invalid event selector");
                    continue;
                }
            };
            if targets.is_empty() {
                tracing::warn!(element = %self.name(), selector = %def.selector, event = %def.event, "event selector matched nothing");
            }
            for target in targets {
                let handler = def.listener.clone();
                let (weak_element, weak_content) = (element.downgrade(), content.downgrade());
                target.add_event_listener(&def.event, move |event| {
                    match (weak_element.upgrade(), weak_content.upgrade()) {
                        (Some(element), Some(content)) => handler(event, &element, &content),
                        _ => Ok(()),
                    }
                });
            }
        }
    }
}

/// Rewrite the attribute with its transformed value when they differ.
fn normalize_attribute(element: &Element, name: &str, transforms: &[Transform], current: Option<&str>) {
    let next = apply_transforms(transforms, current.map(Value::from)).map(|value| value.to_string());
    if next.as_deref() == current {
        return;
    }
    match next {
        Some(value) => element.set_attribute(name, &value),
        None => element.remove_attribute(name),
    }
}

/// Keep the attribute normalized through its transforms on every write.
fn guard_attribute(element: &Element, name: &str, transforms: Vec<Transform>) {
    let weak = element.downgrade();
    let attribute = name.to_owned();
    let busy = Cell::new(false);
    element.observe_attribute(name, move |value| {
        if busy.get() {
            return;
        }
        let Some(element) = weak.upgrade() else {
            return;
        };
        busy.set(true);
        normalize_attribute(&element, &attribute, &transforms, value);
        busy.set(false);
    });
}
