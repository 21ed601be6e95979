//! The event payload delivered to element and document listeners.

use std::fmt;

use crate::value::Value;

/// A named notification with an optional detail value.
///
/// Events dispatched on an element bubble through its ancestors when
/// `bubbles` is set; registry and service notifications never bubble.
#[derive(Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub detail: Option<Value>,
    pub bubbles: bool,
}

impl Event {
    /// A non-bubbling event without detail.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
            bubbles: false,
        }
    }

    /// Attach a detail value (builder).
    pub fn with_detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Make the event bubble (builder).
    pub fn bubbling(mut self) -> Self {
        self.bubbles = true;
        self
    }

    /// The detail as a string, if it is one.
    pub fn detail_str(&self) -> Option<&str> {
        self.detail.as_ref().and_then(Value::as_str)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("detail", &self.detail)
            .field("bubbles", &self.bubbles)
            .finish()
    }
}
