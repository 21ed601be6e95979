//! Crate-wide error type.
//!
//! Directive validation, platform registration and registry bookkeeping all
//! fail synchronously with a [`ZephError`]. Resource failures surface through
//! the pending barrier and reject the owning `define()` call.

use crate::dom::selector::SelectorError;

/// Errors produced by the component-definition engine.
#[derive(Debug, thiserror::Error)]
pub enum ZephError {
    /// A component or custom-element name does not satisfy the naming rules.
    #[error("invalid component name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The registry already tracks a component with this name.
    #[error("component '{0}' is already defined")]
    DuplicateComponent(String),

    /// The platform element registry already holds this name. Platform
    /// registrations are permanent, so this also fires after an `undefine`.
    #[error("custom element '{0}' is already registered with the document")]
    AlreadyRegistered(String),

    /// A directive was called with a malformed argument.
    #[error("{directive}: {message}")]
    Validation {
        directive: &'static str,
        message: String,
    },

    /// `attribute()` was declared twice for the same name.
    #[error("attribute '{0}' is already declared")]
    DuplicateAttribute(String),

    /// `property()` was declared twice for the same name.
    #[error("property '{0}' is already declared")]
    DuplicateProperty(String),

    /// A binding name does not start with `@`, `.` or equal `$`.
    #[error("invalid binding name '{0}': expected '@attribute', '.property' or '$'")]
    InvalidBindingName(String),

    /// A selector argument failed to parse.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// Transport-level failure while probing or fetching a resource.
    #[error("network error for '{url}': {message}")]
    Network { url: String, message: String },

    /// A `from()` parent was announced but is not defined at merge time.
    #[error("component '{child}' inherits from unknown component '{parent}'")]
    UnknownParent { child: String, parent: String },

    /// The registry went away while a definition was waiting on it.
    #[error("registry is no longer available")]
    RegistryUnavailable,

    /// A `wait_for` future was abandoned before the component was defined.
    #[error("stopped waiting for component '{name}'")]
    WaitAbandoned { name: String },

    /// The service registry already holds this name.
    #[error("service '{0}' is already registered")]
    DuplicateService(String),

    /// The background definition task ended without a result.
    #[error("definition task failed: {0}")]
    Task(String),

    /// Free-form failure raised by a definition function.
    #[error("{0}")]
    Custom(String),
}

impl ZephError {
    /// Build a [`ZephError::Custom`] from any message.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    pub(crate) fn validation(directive: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            directive,
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ZephError> = std::result::Result<T, E>;

/// Error type returned by user listeners. Failures are logged, never rethrown.
pub type ListenerError = Box<dyn std::error::Error>;

/// Return type of every user listener.
pub type ListenerResult = std::result::Result<(), ListenerError>;
