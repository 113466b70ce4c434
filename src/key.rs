//! # Primary Keys
//!
//! Remote objects are identified by integer or string keys. Compound keys are
//! component values joined with [`DELIMITER`], e.g. `12345:01` for a job part.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Separator between the components of a compound key.
pub const DELIMITER: char = ':';

/// A remote primary key.
///
/// Equality is type-sensitive: `Key::Int(6)` and `Key::Str("6")` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Values the remote service treats as "no key".
    ///
    /// The service rejects an integer zero with a fault, so zero counts as null
    /// along with the empty string.
    pub fn is_null(&self) -> bool {
        match self {
            Key::Int(n) => *n == 0,
            Key::Str(s) => s.is_empty(),
        }
    }

    /// Interpret an attribute value as a key.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Key::Int(i),
                None => Key::Str(n.to_string()),
            }),
            Value::String(s) => Some(Key::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(n) => Value::from(*n),
            Key::Str(s) => Value::from(s.as_str()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Str(_) => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Key::Str(s) if is_compound(s))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n.into())
    }
}

impl From<u32> for Key {
    fn from(n: u32) -> Self {
        Key::Int(n.into())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// True if a key (or foreign-key name) names several components.
pub fn is_compound(name: &str) -> bool {
    name.contains(DELIMITER)
}

/// Join key components into a compound key.
pub fn join_keys<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            joined.push(DELIMITER);
        }
        joined.push_str(part.as_ref());
    }
    joined
}

/// Split a compound key into its components.
pub fn split_key(key: &str) -> Vec<String> {
    key.split(DELIMITER).map(str::to_string).collect()
}
