//! Dynamic values carried by properties, bindings and event details.

use std::fmt;
use std::rc::Rc;

/// A property or binding value. "Undefined" is modelled as `Option::None`
/// wherever a value may be absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: numbers as-is, booleans as 0/1, numeric strings parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    /// Truthiness in the usual scripting sense.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

/// A value transform applied on property sets, attribute writes and binding
/// propagation. Returning `None` means "undefined".
pub type Transform = Rc<dyn Fn(Option<Value>) -> Option<Value>>;

/// Wrap a closure as a [`Transform`].
pub fn transform(f: impl Fn(Option<Value>) -> Option<Value> + 'static) -> Transform {
    Rc::new(f)
}

/// Run a value through a chain of transforms, first to last.
pub(crate) fn apply_transforms(transforms: &[Transform], value: Option<Value>) -> Option<Value> {
    transforms.iter().fold(value, |value, t| t(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_numbers() {
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(true).to_string(), "true");
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Value::from(" 42 ").as_f64(), Some(42.0));
        assert_eq!(Value::from("x").as_f64(), None);
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("a").is_truthy());
        assert!(!Value::from(0).is_truthy());
    }

    #[test]
    fn transform_chain_runs_in_order() {
        let chain = vec![
            transform(|v| v.map(|v| Value::from(format!("{v}a")))),
            transform(|v| v.map(|v| Value::from(format!("{v}b")))),
        ];
        assert_eq!(apply_transforms(&chain, Some("x".into())), Some(Value::from("xab")));
        assert_eq!(apply_transforms(&chain, None), None);
    }
}
