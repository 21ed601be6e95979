//! The component registry.
//!
//! `define` tracks a component under its name, runs the definition function
//! on the local task set, waits for its pending work, merges a `from` parent,
//! generates the element class and registers it (and any aliases) with the
//! document. The registry owns the pending set and ready timer, so separate
//! registries never see each other's state.
//!
//! Everything here is `!Send`; `define` must be called from within a
//! [`tokio::task::LocalSet`].

pub mod component;
pub mod events;
pub mod handle;
mod pending;
pub mod view;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{self, LocalBoxFuture};
use indexmap::IndexMap;
use tokio::sync::oneshot;

pub use component::Component;
pub use handle::DefineHandle;
pub use view::ComponentsView;

use self::events::announce;
use self::pending::PendingSet;
use crate::config::ZephConfig;
use crate::context::{Definition, DefinitionContext};
use crate::dom::{validate_element_name, Document};
use crate::element::ElementClass;
use crate::error::{Result, ZephError};
use crate::resource::{Fetcher, Resolver};
use crate::service::ServiceRegistry;

pub(crate) struct RegistryState {
    document: Document,
    resolver: Resolver,
    config: ZephConfig,
    pub(crate) components: RefCell<IndexMap<String, Component>>,
    waiters: RefCell<HashMap<String, Vec<oneshot::Sender<()>>>>,
    pending: PendingSet,
    services: ServiceRegistry,
}

impl RegistryState {
    fn is_defined(&self, name: &str) -> bool {
        self.components
            .borrow()
            .get(name)
            .is_some_and(Component::is_defined)
    }

    /// Resolves once `name` is defined; immediately if it already is.
    pub(crate) fn wait_for(&self, name: &str) -> LocalBoxFuture<'static, Result<()>> {
        if self.is_defined(name) {
            return Box::pin(future::ready(Ok(())));
        }
        let (sender, receiver) = oneshot::channel();
        self.waiters
            .borrow_mut()
            .entry(name.to_owned())
            .or_default()
            .push(sender);
        let name = name.to_owned();
        Box::pin(async move { receiver.await.map_err(|_| ZephError::WaitAbandoned { name }) })
    }

    fn begin(self: &Rc<Self>, name: &str, origin: &str) -> Result<(Component, u64)> {
        validate_element_name(name)?;
        if self.components.borrow().contains_key(name) {
            return Err(ZephError::DuplicateComponent(name.to_owned()));
        }
        let definition = Definition::new(
            DefinitionContext::new(name, origin),
            self.resolver.clone(),
            self.config.clone(),
            Rc::downgrade(self),
        );
        let component = Component::new(name, origin, definition);
        self.components
            .borrow_mut()
            .insert(name.to_owned(), component.clone());
        let ticket = self.pending.begin(name);
        tracing::debug!(component = name, origin, ticket, "definition started");
        announce(&self.document, events::LOADING, name);
        Ok((component, ticket))
    }

    async fn complete(&self, component: &Component, body: LocalBoxFuture<'static, Result<()>>) -> Result<()> {
        body.await?;
        let definition = component.definition();
        definition.settle().await?;

        let mut context = definition.context().snapshot();
        if let Some(parent) = context.from.clone() {
            let parent_class = self
                .components
                .borrow()
                .get(&parent)
                .and_then(Component::element_class)
                .ok_or_else(|| ZephError::UnknownParent {
                    child: context.name.clone(),
                    parent: parent.clone(),
                })?;
            context.inherit(parent_class.context());
            definition.replace_context(context.snapshot());
            tracing::debug!(component = %context.name, parent = %parent, "inherited parent definition");
        }

        let class = ElementClass::generate(context);
        self.document.define_element(class.clone())?;
        for alias in &class.context().aliases {
            self.document.define_element(class.alias(alias))?;
        }
        component.set_class(class.clone());
        class.initialized();

        if let Some(waiters) = self.waiters.borrow_mut().remove(component.name()) {
            for waiter in waiters {
                let _ = waiter.send(());
            }
        }
        Ok(())
    }

    fn finish(self: &Rc<Self>, name: &str, ticket: u64, defined: bool) {
        let idle = self.pending.end(ticket);
        if defined {
            announce(&self.document, events::DEFINED, name);
        }
        if !idle {
            return;
        }
        let state = Rc::downgrade(self);
        let settle = self.config.ready_settle;
        self.pending.arm(tokio::task::spawn_local(async move {
            tokio::time::sleep(settle).await;
            if let Some(state) = state.upgrade() {
                state.announce_ready();
            }
        }));
    }

    fn announce_ready(&self) {
        if self.pending.complete() {
            tracing::debug!("all component definitions settled");
            self.document.dispatch_event(&crate::event::Event::new(events::READY));
        }
    }
}

async fn run_definition(
    state: Rc<RegistryState>,
    component: Component,
    ticket: u64,
    body: LocalBoxFuture<'static, Result<()>>,
) -> Result<Component> {
    let result = state.complete(&component, body).await;
    state.finish(component.name(), ticket, result.is_ok());
    match result {
        Ok(()) => {
            tracing::debug!(component = component.name(), "component defined");
            Ok(component)
        }
        Err(err) => {
            tracing::error!(component = component.name(), error = %err, "component definition failed");
            Err(err)
        }
    }
}

/// Catalog of named components for one document realm.
#[derive(Clone)]
pub struct Registry {
    state: Rc<RegistryState>,
}

impl Registry {
    pub fn new(document: &Document, fetcher: Rc<dyn Fetcher>, config: ZephConfig) -> Self {
        Self {
            state: Rc::new(RegistryState {
                document: document.clone(),
                resolver: Resolver::new(fetcher),
                config,
                components: RefCell::default(),
                waiters: RefCell::default(),
                pending: PendingSet::default(),
                services: ServiceRegistry::new(document),
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn config(&self) -> &ZephConfig {
        &self.state.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.state.resolver
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.state.services
    }

    fn start(
        &self,
        name: &str,
        origin: &str,
        body: impl FnOnce(Definition) -> LocalBoxFuture<'static, Result<()>>,
    ) -> DefineHandle {
        match self.state.begin(name, origin) {
            Ok((component, ticket)) => {
                let body = body(component.definition().clone());
                let task = run_definition(self.state.clone(), component, ticket, body);
                DefineHandle::running(tokio::task::spawn_local(task))
            }
            Err(err) => {
                tracing::error!(component = name, error = %err, "define rejected");
                DefineHandle::failed(err)
            }
        }
    }

    /// Define a component with a synchronous definition function. Relative
    /// resources resolve against the configured origin.
    pub fn define<F>(&self, name: &str, definition: F) -> DefineHandle
    where
        F: FnOnce(&Definition) -> Result<()> + 'static,
    {
        let origin = self.state.config.origin.clone();
        self.define_from(name, &origin, definition)
    }

    /// Like [`define`](Self::define), resolving resources against `origin`.
    pub fn define_from<F>(&self, name: &str, origin: &str, definition: F) -> DefineHandle
    where
        F: FnOnce(&Definition) -> Result<()> + 'static,
    {
        self.start(name, origin, move |handle| Box::pin(async move { definition(&handle) }))
    }

    /// Define a component with an async definition function.
    pub fn define_async<F, Fut>(&self, name: &str, definition: F) -> DefineHandle
    where
        F: FnOnce(Definition) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        let origin = self.state.config.origin.clone();
        self.define_async_from(name, &origin, definition)
    }

    pub fn define_async_from<F, Fut>(&self, name: &str, origin: &str, definition: F) -> DefineHandle
    where
        F: FnOnce(Definition) -> Fut + 'static,
        Fut: Future<Output = Result<()>> + 'static,
    {
        self.start(name, origin, move |handle| Box::pin(definition(handle)))
    }

    /// Forget `name`. The document keeps its element registration, so the
    /// name cannot be defined successfully again.
    pub fn undefine(&self, name: &str) -> bool {
        let removed = self.state.components.borrow_mut().shift_remove(name);
        match removed {
            Some(_) => {
                tracing::debug!(component = name, "component undefined");
                announce(&self.state.document, events::UNDEFINED, name);
                true
            }
            None => false,
        }
    }

    /// Whether `name` is tracked, defined or still pending.
    pub fn has(&self, name: &str) -> bool {
        self.state.components.borrow().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Component> {
        self.state.components.borrow().get(name).cloned()
    }

    /// Tracked names in definition order.
    pub fn names(&self) -> Vec<String> {
        self.state.components.borrow().keys().cloned().collect()
    }

    pub fn components(&self) -> ComponentsView {
        ComponentsView::new(self.state.clone())
    }

    /// Resolves once `name` is defined.
    pub fn wait_for(&self, name: &str) -> impl Future<Output = Result<()>> + 'static {
        self.state.wait_for(name)
    }

    /// Resolves on the next ready signal, or immediately if no definition
    /// is pending since the last one.
    pub fn ready(&self) -> impl Future<Output = Result<()>> + 'static {
        let receiver = self.state.pending.wait();
        async move {
            match receiver {
                Some(receiver) => receiver.await.map_err(|_| ZephError::WaitAbandoned {
                    name: events::READY.to_owned(),
                }),
                None => Ok(()),
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.pending.is_ready()
    }

    /// Definitions currently in flight.
    pub fn pending_count(&self) -> usize {
        self.state.pending.len()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("components", &self.names())
            .field("pending", &self.pending_count())
            .field("ready", &self.is_ready())
            .finish()
    }
}
