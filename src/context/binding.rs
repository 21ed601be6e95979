//! Binding descriptors: `@attribute`, `.property` and `$` (text content)
//! endpoints joined by an optional transform.

use std::fmt;

use crate::error::{Result, ZephError};
use crate::value::Transform;

/// Selector meaning "the component root element itself".
pub const ROOT: &str = ".";

/// What a binding endpoint watches or writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sigil {
    /// `@name`: an attribute.
    Attribute(String),
    /// `.name`: a property cell.
    Property(String),
    /// `$`: the text content.
    Content,
}

impl Sigil {
    /// Parse a binding name.
    pub fn parse(name: &str) -> Result<Self> {
        if name == "$" {
            return Ok(Sigil::Content);
        }
        if let Some(attr) = name.strip_prefix('@').filter(|rest| !rest.is_empty()) {
            return Ok(Sigil::Attribute(attr.to_ascii_lowercase()));
        }
        if let Some(prop) = name.strip_prefix('.').filter(|rest| !rest.is_empty()) {
            return Ok(Sigil::Property(prop.to_owned()));
        }
        Err(ZephError::InvalidBindingName(name.to_owned()))
    }
}

impl fmt::Display for Sigil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sigil::Attribute(name) => write!(f, "@{name}"),
            Sigil::Property(name) => write!(f, ".{name}"),
            Sigil::Content => f.write_str("$"),
        }
    }
}

/// One side of a binding: an element selector (or [`ROOT`]) and a sigil.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingEnd {
    pub element: String,
    pub name: Sigil,
}

impl BindingEnd {
    pub fn is_root(&self) -> bool {
        self.element == ROOT
    }
}

impl fmt::Display for BindingEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.element, self.name)
    }
}

/// A source-to-target propagation rule.
#[derive(Clone)]
pub struct Binding {
    pub source: BindingEnd,
    pub target: BindingEnd,
    /// Runs once per propagation before the target write. Identity if `None`.
    pub transform: Option<Transform>,
}

impl Binding {
    /// Composite identity `source_el:source_name>target_el:target_name`.
    /// Re-declaring the same pair replaces the earlier binding.
    pub fn key(&self) -> String {
        format!("{}>{}", self.source, self.target)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("source", &self.source.to_string())
            .field("target", &self.target.to_string())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sigils() {
        assert_eq!(Sigil::parse("@Label").unwrap(), Sigil::Attribute("label".into()));
        assert_eq!(Sigil::parse(".count").unwrap(), Sigil::Property("count".into()));
        assert_eq!(Sigil::parse("$").unwrap(), Sigil::Content);
    }

    #[test]
    fn reject_malformed_names() {
        for bad in ["label", "@", ".", "$$", "", "#id"] {
            assert!(
                matches!(Sigil::parse(bad), Err(ZephError::InvalidBindingName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn key_format() {
        let binding = Binding {
            source: BindingEnd {
                element: ROOT.into(),
                name: Sigil::Attribute("x".into()),
            },
            target: BindingEnd {
                element: "div".into(),
                name: Sigil::Content,
            },
            transform: None,
        };
        assert_eq!(binding.key(), ".:@x>div:$");
        assert!(binding.source.is_root());
    }
}
