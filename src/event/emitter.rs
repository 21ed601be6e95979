//! Named-event pub/sub with deferred and immediate delivery.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::scheduler::{fire_immediately, Scheduler};
use crate::error::ListenerResult;
use crate::value::Value;

/// Handle returned by listener registration, used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Listener invoked with the arguments passed to `fire`.
pub type EmitterListener = Rc<dyn Fn(&[Value]) -> ListenerResult>;

struct Entry {
    id: ListenerId,
    event: String,
    once: bool,
    listener: EmitterListener,
}

/// A pub/sub hub keyed by event name.
///
/// `fire` queues delivery on the scheduler; `fire_immediately` delivers
/// inline. A `once` listener is removed as soon as a fire selects it.
#[derive(Clone)]
pub struct Emitter {
    scheduler: Scheduler,
    entries: Rc<RefCell<Vec<Entry>>>,
    next: Rc<Cell<u64>>,
}

impl Emitter {
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            scheduler: scheduler.clone(),
            entries: Rc::default(),
            next: Rc::default(),
        }
    }

    fn add(&self, event: &str, once: bool, listener: impl Fn(&[Value]) -> ListenerResult + 'static) -> ListenerId {
        let id = ListenerId(self.next.get());
        self.next.set(id.0 + 1);
        self.entries.borrow_mut().push(Entry {
            id,
            event: event.to_owned(),
            once,
            listener: Rc::new(listener),
        });
        id
    }

    /// Register a listener for `event`.
    pub fn on(&self, event: &str, listener: impl Fn(&[Value]) -> ListenerResult + 'static) -> ListenerId {
        self.add(event, false, listener)
    }

    /// Register a listener that runs at most once.
    pub fn once(&self, event: &str, listener: impl Fn(&[Value]) -> ListenerResult + 'static) -> ListenerId {
        self.add(event, true, listener)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.entries.borrow().iter().filter(|e| e.event == event).count()
    }

    fn select(&self, event: &str) -> Vec<EmitterListener> {
        let mut entries = self.entries.borrow_mut();
        let selected = entries
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| entry.listener.clone())
            .collect();
        entries.retain(|entry| !(entry.once && entry.event == event));
        selected
    }

    /// Queue delivery of `args` to every listener of `event`.
    pub fn fire(&self, event: &str, args: Vec<Value>) {
        let listeners = self.select(event);
        self.scheduler.fire(event, listeners, move |listener| listener(args.as_slice()));
    }

    /// Deliver `args` to every listener of `event` now. Returns how many
    /// listeners failed.
    pub fn fire_immediately(&self, event: &str, args: &[Value]) -> usize {
        let listeners = self.select(event);
        fire_immediately(event, &listeners, |listener| listener(args))
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.entries.borrow().len())
            .finish()
    }
}
