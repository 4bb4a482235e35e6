//! Dynamic value model for pushed layer entries.
//!
//! Third-party tags push arbitrary runtime values: plain JSON shapes, but
//! also dates, regexes, markup nodes, callables, non-finite numbers, and
//! object graphs that alias or cycle. `List` and `Map` nodes are shared
//! (`Arc`) with interior mutability so those graphs are representable; the
//! sanitizer resolves them into deterministic lossy JSON.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

pub type SharedList = Arc<Mutex<Vec<RawValue>>>;
pub type SharedMap = Arc<Mutex<Vec<(String, RawValue)>>>;

#[derive(Clone)]
pub enum RawValue {
    Null,
    Bool(bool),
    /// Any numeric, including `NaN` and infinities.
    Number(f64),
    Text(String),
    /// A date-like value.
    Timestamp(DateTime<Utc>),
    /// A regex-like value, carried as its source text.
    Pattern(String),
    /// A markup node, carried as its outer markup.
    Element(String),
    /// A callable, carried as its source text.
    Callable(String),
    List(SharedList),
    Map(SharedMap),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    pub fn list(items: Vec<RawValue>) -> Self {
        RawValue::List(Arc::new(Mutex::new(items)))
    }

    pub fn map(pairs: Vec<(String, RawValue)>) -> Self {
        RawValue::Map(Arc::new(Mutex::new(pairs)))
    }

    /// Entry-shaped convenience: a map with a string `event` field.
    pub fn event(name: &str, mut fields: Vec<(String, RawValue)>) -> Self {
        let mut pairs = vec![("event".to_string(), RawValue::text(name))];
        pairs.append(&mut fields);
        RawValue::map(pairs)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

// Shallow on purpose: shared nodes can be cyclic, so a derived Debug
// would recurse forever.
impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => f.write_str("Null"),
            RawValue::Bool(value) => write!(f, "Bool({value})"),
            RawValue::Number(value) => write!(f, "Number({value})"),
            RawValue::Text(value) => write!(f, "Text({value:?})"),
            RawValue::Timestamp(value) => write!(f, "Timestamp({value})"),
            RawValue::Pattern(value) => write!(f, "Pattern({value:?})"),
            RawValue::Element(_) => f.write_str("Element(..)"),
            RawValue::Callable(_) => f.write_str("Callable(..)"),
            RawValue::List(items) => write!(f, "List(len={})", lock_shared(items).len()),
            RawValue::Map(pairs) => write!(f, "Map(len={})", lock_shared(pairs).len()),
        }
    }
}

/// Lock a shared node, recovering from poisoning (a panicked pusher must
/// not make the value unserializable).
pub(crate) fn lock_shared<T>(node: &Arc<Mutex<T>>) -> std::sync::MutexGuard<'_, T> {
    node.lock().unwrap_or_else(PoisonError::into_inner)
}
