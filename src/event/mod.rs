//! Event system: deferred task queue, event payloads, pub/sub emitters.

pub mod emitter;
pub mod message;
pub mod scheduler;

pub use emitter::{Emitter, EmitterListener, ListenerId};
pub use message::Event;
pub use scheduler::{fire_immediately, Scheduler, Task};
