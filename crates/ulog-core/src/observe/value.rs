//! Dynamically typed property values

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::target::{List, Node, Target};

/// A value stored in an observed property.
///
/// Records and lists are observed containers: storing one in a property links
/// it to that property so nested mutations can be reported to the owner's
/// observers. Anything else that is not a plain scalar travels as opaque
/// [`Value::Data`].
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Record(Target),
    List(List),
    Data(Rc<dyn Any>),
}

impl Value {
    /// Wrap an arbitrary typed payload.
    pub fn data<T: Any>(value: T) -> Self {
        Value::Data(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Target> {
        match self {
            Value::Record(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Downcast an opaque payload to its concrete type.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Value::Data(data) => Rc::clone(data).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// The observed container behind this value, if any
    pub(crate) fn node(&self) -> Option<&Rc<Node>> {
        match self {
            Value::Record(t) => Some(t.node()),
            Value::List(l) => Some(l.node()),
            _ => None,
        }
    }
}

/// Containers and opaque payloads compare by identity, scalars by value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Data(a), Value::Data(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Text(s) => write!(f, "Text({:?})", s),
            Value::Record(t) => write!(f, "{:?}", t),
            Value::List(l) => write!(f, "{:?}", l),
            Value::Data(_) => write!(f, "Data(..)"),
        }
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

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Target> for Value {
    fn from(value: Target) -> Self {
        Value::Record(value)
    }
}

impl From<List> for Value {
    fn from(value: List) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
