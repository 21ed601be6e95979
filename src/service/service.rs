use crate::error::ListenerResult;
use crate::event::{Emitter, ListenerId, Scheduler};
use crate::value::Value;

/// A named pub/sub hub components share through the [`ServiceRegistry`].
///
/// [`ServiceRegistry`]: super::ServiceRegistry
#[derive(Clone, Debug)]
pub struct Service {
    name: String,
    emitter: Emitter,
}

impl Service {
    pub fn new(name: impl Into<String>, scheduler: &Scheduler) -> Self {
        Self {
            name: name.into(),
            emitter: Emitter::new(scheduler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn on(&self, event: &str, listener: impl Fn(&[Value]) -> ListenerResult + 'static) -> ListenerId {
        self.emitter.on(event, listener)
    }

    pub fn once(&self, event: &str, listener: impl Fn(&[Value]) -> ListenerResult + 'static) -> ListenerId {
        self.emitter.once(event, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.emitter.off(id)
    }

    /// Queue delivery to every listener of `event`.
    pub fn fire(&self, event: &str, args: Vec<Value>) {
        self.emitter.fire(event, args);
    }

    pub fn fire_immediately(&self, event: &str, args: &[Value]) -> usize {
        self.emitter.fire_immediately(event, args)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn delegates_to_the_emitter() {
        let scheduler = Scheduler::new();
        let service = Service::new("auth", &scheduler);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        service.on("login", move |args: &[Value]| {
            sink.borrow_mut().push(args.len());
            Ok(())
        });

        service.fire("login", vec![Value::from("ann")]);
        assert!(log.borrow().is_empty());
        scheduler.run_pending();
        assert_eq!(*log.borrow(), vec![1]);

        assert_eq!(service.fire_immediately("login", &[]), 1);
        assert_eq!(*log.borrow(), vec![1, 0]);
        assert_eq!(service.name(), "auth");
    }
}
