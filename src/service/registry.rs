use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::Service;
use crate::dom::Document;
use crate::error::{Result, ZephError};
use crate::registry::events::{announce, SERVICE_REGISTERED, SERVICE_UNREGISTERED};

/// Named services for one document. Clones share the same table.
#[derive(Clone)]
pub struct ServiceRegistry {
    document: Document,
    services: Rc<RefCell<IndexMap<String, Service>>>,
}

impl ServiceRegistry {
    pub fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
            services: Rc::default(),
        }
    }

    /// Create and register a service backed by the document's scheduler.
    pub fn create(&self, name: &str) -> Result<Service> {
        let service = Service::new(name, self.document.scheduler());
        self.register(service.clone())?;
        Ok(service)
    }

    pub fn register(&self, service: Service) -> Result<()> {
        let name = service.name().to_owned();
        {
            let mut services = self.services.borrow_mut();
            if services.contains_key(&name) {
                return Err(ZephError::DuplicateService(name));
            }
            services.insert(name.clone(), service);
        }
        tracing::debug!(service = %name, "service registered");
        announce(&self.document, SERVICE_REGISTERED, &name);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Option<Service> {
        let removed = self.services.borrow_mut().shift_remove(name)?;
        tracing::debug!(service = name, "service unregistered");
        announce(&self.document, SERVICE_UNREGISTERED, name);
        Some(removed)
    }

    pub fn has(&self, name: &str) -> bool {
        self.services.borrow().contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Service> {
        self.services.borrow().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.services.borrow().keys().cloned().collect()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
