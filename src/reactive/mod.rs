//! Reactive state: observable property cells backing element properties.

pub mod property;

pub use property::{Property, Subscriber, SubscriptionId};
