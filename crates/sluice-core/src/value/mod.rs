//! Dynamic values flowing through pipelines.

mod display;
mod ops;
mod order;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{PipeError, Result};

/// A value carried by a pipeline.
///
/// Values form a total order (see [`Ord`]) so they can be sorted, used as
/// set members and as mapping keys.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of a value.
    #[default]
    None,
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Immutable string.
    Str(Arc<str>),
    /// Fixed sequence, the usual shape of pipeline records.
    Tuple(Vec<Value>),
    List(Vec<Value>),
    /// Ordered set. Frozen and mutable sets share this variant.
    Set(BTreeSet<Value>),
    /// Ordered mapping.
    Dict(BTreeMap<Value, Value>),
}

impl Value {
    /// Builds a string value.
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Builds a tuple from anything convertible into values.
    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a list from anything convertible into values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set from anything convertible into values.
    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a mapping from key/value pairs. Later keys win.
    pub fn dict<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns true if this value is None.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Attempts to extract a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer. Bools count as 0 and 1.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Attempts to extract a float, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    /// Attempts to extract a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements of a tuple or list.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(v) | Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to extract a mapping.
    pub fn as_dict(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Name of the value's type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
        }
    }

    /// Truthiness: None, zero and empty containers are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(v) | Value::List(v) => !v.is_empty(),
            Value::Set(s) => !s.is_empty(),
            Value::Dict(d) => !d.is_empty(),
        }
    }

    /// Returns true if [`items`](Self::items) would succeed.
    pub fn is_iterable(&self) -> bool {
        matches!(
            self,
            Value::Str(_) | Value::Tuple(_) | Value::List(_) | Value::Set(_) | Value::Dict(_)
        )
    }

    /// Iterates the value: sequence elements, set members, mapping keys or
    /// the characters of a string.
    pub fn items(&self) -> Result<Vec<Value>> {
        match self {
            Value::Tuple(v) | Value::List(v) => Ok(v.clone()),
            Value::Set(s) => Ok(s.iter().cloned().collect()),
            Value::Dict(d) => Ok(d.keys().cloned().collect()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            other => Err(PipeError::Type(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Consuming form of [`items`](Self::items).
    pub fn into_items(self) -> Result<Vec<Value>> {
        match self {
            Value::Tuple(v) | Value::List(v) => Ok(v),
            Value::Set(s) => Ok(s.into_iter().collect()),
            Value::Dict(d) => Ok(d.into_keys().collect()),
            other => other.items(),
        }
    }

    /// Number of elements of a container or characters of a string.
    pub fn len(&self) -> Result<usize> {
        match self {
            Value::Str(s) => Ok(s.chars().count()),
            Value::Tuple(v) | Value::List(v) => Ok(v.len()),
            Value::Set(s) => Ok(s.len()),
            Value::Dict(d) => Ok(d.len()),
            other => Err(PipeError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        }
    }

    /// Returns true for empty containers and strings.
    pub fn is_empty(&self) -> bool {
        matches!(self.len(), Ok(0))
    }

    /// Subscript: sequence position (negative counts from the end),
    /// string character, or mapping key.
    pub fn index(&self, key: &Value) -> Result<Value> {
        match self {
            Value::Tuple(v) | Value::List(v) => {
                let pos = seq_position(self.type_name(), key, v.len())?;
                Ok(v[pos].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let pos = seq_position("string", key, chars.len())?;
                Ok(Value::str(chars[pos].to_string()))
            }
            Value::Dict(d) => d
                .get(key)
                .cloned()
                .ok_or_else(|| PipeError::Key(key.repr())),
            other => Err(PipeError::Type(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    /// Returns the mapping with `key` set to `value`.
    pub fn with_entry(self, key: Value, value: Value) -> Result<Value> {
        match self {
            Value::Dict(mut d) => {
                d.insert(key, value);
                Ok(Value::Dict(d))
            }
            other => Err(PipeError::Type(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }
}

fn seq_position(type_name: &str, key: &Value, len: usize) -> Result<usize> {
    let idx = match key {
        Value::Int(i) => *i,
        Value::Bool(b) => i64::from(*b),
        other => {
            return Err(PipeError::Type(format!(
                "{} indices must be integers, not {}",
                type_name,
                other.type_name()
            )))
        }
    };
    let resolved = if idx < 0 { idx + len as i64 } else { idx };
    if resolved < 0 || resolved >= len as i64 {
        return Err(PipeError::Index(format!("{} index out of range", type_name)));
    }
    Ok(resolved as usize)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::str(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Value::Tuple(vec![a.into(), b.into(), c.into()])
    }
}
