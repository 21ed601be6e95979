//! The pending set behind the ready signal.
//!
//! Every `define` call takes a ticket when it starts and returns it when it
//! settles either way. Tickets are unique per call, so a name undefined and
//! defined again while the first run is in flight counts twice. When the set drains, the registry arms a single timer; any new
//! definition disarms it. The timer firing on an empty set completes the
//! batch exactly once and wakes every `ready()` waiter.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Default)]
pub(crate) struct PendingSet {
    entries: RefCell<IndexMap<u64, String>>,
    next: Cell<u64>,
    ready: Cell<bool>,
    timer: RefCell<Option<JoinHandle<()>>>,
    waiters: RefCell<Vec<oneshot::Sender<()>>>,
}

impl PendingSet {
    /// Track a definition of `name`; the ticket identifies this run.
    pub(crate) fn begin(&self, name: &str) -> u64 {
        let ticket = self.next.get();
        self.next.set(ticket + 1);
        self.entries.borrow_mut().insert(ticket, name.to_owned());
        self.ready.set(false);
        self.disarm();
        ticket
    }

    /// Release `ticket`. Returns `true` when nothing is pending any more.
    pub(crate) fn end(&self, ticket: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        entries.shift_remove(&ticket);
        entries.is_empty()
    }

    /// Install the settle timer, aborting a previous one.
    pub(crate) fn arm(&self, timer: JoinHandle<()>) {
        if let Some(previous) = self.timer.replace(Some(timer)) {
            previous.abort();
        }
    }

    fn disarm(&self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Mark the batch complete. Returns `false` if work is pending again or
    /// the batch was already completed.
    pub(crate) fn complete(&self) -> bool {
        if !self.entries.borrow().is_empty() || self.ready.get() {
            return false;
        }
        self.ready.set(true);
        self.timer.take();
        for waiter in self.waiters.take() {
            let _ = waiter.send(());
        }
        true
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// A receiver woken by the next completion, or `None` if the current
    /// batch is already complete.
    pub(crate) fn wait(&self) -> Option<oneshot::Receiver<()>> {
        if self.ready.get() {
            return None;
        }
        let (sender, receiver) = oneshot::channel();
        self.waiters.borrow_mut().push(sender);
        Some(receiver)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}
