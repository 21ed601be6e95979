//! Deferred task queue and error-isolated listener fan-out.
//!
//! [`Scheduler`] maintains a queue of deferred tasks owned by a realm. Tasks
//! are pushed via `defer` and drained via `run_pending`, which keeps popping
//! until the queue is empty so tasks deferred by other tasks run in the same
//! pass. [`Scheduler::fire`] defers a listener fan-out; [`fire_immediately`]
//! runs it inline. Both isolate listener failures: an `Err` is logged and the
//! remaining listeners still run.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::error::ListenerResult;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Queue-based deferred task runner. Cloning yields another handle to the
/// same queue.
#[derive(Clone, Default)]
pub struct Scheduler {
    queue: Rc<RefCell<VecDeque<Task>>>,
}

impl Scheduler {
    /// Create a new, empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a task for the next drain.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Run queued tasks until the queue is empty, including tasks enqueued
    /// while draining. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow ends before the task runs so tasks may defer more.
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Number of queued tasks.
    pub fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Defer a fan-out of `call` over `listeners`.
    ///
    /// The listener list is captured now; the calls happen on the next drain.
    pub fn fire<L: ?Sized + 'static>(
        &self,
        label: impl Into<String>,
        listeners: Vec<Rc<L>>,
        call: impl FnMut(&L) -> ListenerResult + 'static,
    ) {
        if listeners.is_empty() {
            return;
        }
        let label = label.into();
        self.defer(move || {
            fire_immediately(&label, &listeners, call);
        });
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Call every listener in order. Failures are logged and do not stop the
/// fan-out. Returns the number of listeners that failed.
pub fn fire_immediately<L: ?Sized>(
    label: &str,
    listeners: &[Rc<L>],
    mut call: impl FnMut(&L) -> ListenerResult,
) -> usize {
    let mut failed = 0;
    for (index, listener) in listeners.iter().enumerate() {
        if let Err(err) = call(listener) {
            failed += 1;
            tracing::error!(label, listener = index, error = %err, "listener failed");
        }
    }
    failed
}

// ===========================================================================
// Tests
// ===========================================================================
