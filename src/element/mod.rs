//! Element class generation: construction, deferred setup, bindings and
//! lifecycle callbacks.

mod bind;
pub mod class;
pub(crate) mod setup;

pub use class::ElementClass;
