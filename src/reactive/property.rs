//! Observable property cells.
//!
//! Every element property is a [`Property`]: declared properties, properties
//! synthesized by bindings, and ad-hoc ones set through the element handle.
//! A cell holds an optional [`Value`] (absent means "undefined"), a transform
//! chain applied on every set, and a subscriber list notified with
//! `(old, new)` whenever a set changes the stored value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::value::{apply_transforms, Transform, Value};

/// Identifies a subscription on a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Change callback: `(old, new)`.
pub type Subscriber = Rc<dyn Fn(Option<&Value>, Option<&Value>)>;

#[derive(Default)]
struct PropertyState {
    value: Option<Value>,
    /// Applied in composition order: inherited transforms first.
    transforms: Vec<Transform>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

/// A shared reactive cell. Clones refer to the same cell.
#[derive(Clone, Default)]
pub struct Property(Rc<RefCell<PropertyState>>);

impl Property {
    /// A cell holding `value`, stored as-is.
    pub fn new(value: Option<Value>) -> Self {
        Self(Rc::new(RefCell::new(PropertyState {
            value,
            ..PropertyState::default()
        })))
    }

    /// Current value.
    pub fn get(&self) -> Option<Value> {
        self.0.borrow().value.clone()
    }

    /// Run `value` through the transform chain and store it. Subscribers are
    /// notified after the cell is released, and only when the stored value
    /// actually changed.
    pub fn set(&self, value: Option<Value>) {
        let transforms = self.0.borrow().transforms.clone();
        let value = apply_transforms(&transforms, value);

        let (old, subscribers) = {
            let mut state = self.0.borrow_mut();
            if state.value == value {
                return;
            }
            let old = std::mem::replace(&mut state.value, value.clone());
            let subscribers: Vec<Subscriber> =
                state.subscribers.iter().map(|(_, s)| s.clone()).collect();
            (old, subscribers)
        };

        for subscriber in subscribers {
            subscriber(old.as_ref(), value.as_ref());
        }
    }

    /// Set from a function of the current value.
    pub fn update(&self, f: impl FnOnce(Option<&Value>) -> Option<Value>) {
        let next = f(self.0.borrow().value.as_ref());
        self.set(next);
    }

    /// Register a change callback.
    pub fn subscribe(&self, subscriber: impl Fn(Option<&Value>, Option<&Value>) + 'static) -> SubscriptionId {
        let mut state = self.0.borrow_mut();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.subscribers.push((id, Rc::new(subscriber)));
        id
    }

    /// Remove a change callback. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.0.borrow_mut();
        let before = state.subscribers.len();
        state.subscribers.retain(|(sid, _)| *sid != id);
        state.subscribers.len() != before
    }

    /// Append a transform to the chain. Later transforms see the output of
    /// earlier ones.
    pub fn compose(&self, transform: Transform) {
        self.0.borrow_mut().transforms.push(transform);
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subscribers.len()
    }

    /// Whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Property) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("Property")
            .field("value", &state.value)
            .field("transforms", &state.transforms.len())
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}
