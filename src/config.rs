//! Engine configuration.

use std::time::Duration;

/// Configuration shared by the registry and every definition it runs.
#[derive(Debug, Clone)]
pub struct ZephConfig {
    /// Base URL used to resolve relative resource references when a
    /// component does not carry its own origin.
    pub origin: String,
    /// How long the registry must stay idle before the ready signal fires.
    pub ready_settle: Duration,
    /// Probe the network for html/css filename references. `false` behaves
    /// as if every html/css directive passed `no_remote`.
    pub remote_lookup: bool,
    /// Extension appended when probing html references.
    pub html_extension: String,
    /// Extension appended when probing css references.
    pub css_extension: String,
}

impl Default for ZephConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost/".to_owned(),
            ready_settle: Duration::from_millis(10),
            remote_lookup: true,
            html_extension: ".html".to_owned(),
            css_extension: ".css".to_owned(),
        }
    }
}

impl ZephConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base origin URL (builder).
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the ready-signal settling interval (builder).
    pub fn with_ready_settle(mut self, settle: Duration) -> Self {
        self.ready_settle = settle;
        self
    }

    /// Enable or disable remote filename lookup for html/css (builder).
    pub fn with_remote_lookup(mut self, enabled: bool) -> Self {
        self.remote_lookup = enabled;
        self
    }

    /// Set the html probe extension (builder).
    pub fn with_html_extension(mut self, extension: impl Into<String>) -> Self {
        self.html_extension = extension.into();
        self
    }

    /// Set the css probe extension (builder).
    pub fn with_css_extension(mut self, extension: impl Into<String>) -> Self {
        self.css_extension = extension.into();
        self
    }
}
