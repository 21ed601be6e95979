//! Document-level notifications dispatched by the registries.
//!
//! All of them are non-bubbling. Except for [`READY`], the event detail is
//! the component or service name.

use crate::dom::Document;
use crate::event::Event;

/// A `define` call started.
pub const LOADING: &str = "zeph:loading";
/// A component finished defining successfully.
pub const DEFINED: &str = "zeph:defined";
/// A component was removed from the registry.
pub const UNDEFINED: &str = "zeph:undefined";
/// No definition has been pending for the settle interval.
pub const READY: &str = "zeph:ready";
pub const SERVICE_REGISTERED: &str = "zeph:service-registered";
pub const SERVICE_UNREGISTERED: &str = "zeph:service-unregistered";

pub(crate) fn announce(document: &Document, event: &str, name: &str) {
    tracing::debug!(event, name, "announcing");
    document.dispatch_event(&Event::new(event).with_detail(name));
}
