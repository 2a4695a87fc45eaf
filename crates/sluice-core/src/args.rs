//! Call arguments handed to stage implementations.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::error::{PipeError, Result};
use crate::flow::FlowRef;
use crate::func::Func;
use crate::value::Value;

/// A single stage argument.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Func(Func),
    Flow(FlowRef),
}

impl Arg {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Arg::Func(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_flow(&self) -> Option<&FlowRef> {
        match self {
            Arg::Flow(f) => Some(f),
            _ => None,
        }
    }

    /// Returns true for `Arg::Value(Value::None)`.
    pub fn is_none(&self) -> bool {
        matches!(self, Arg::Value(Value::None))
    }

    fn describe(&self) -> &'static str {
        match self {
            Arg::Value(v) => v.type_name(),
            Arg::Func(_) => "function",
            Arg::Flow(_) => "flow",
        }
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<Func> for Arg {
    fn from(f: Func) -> Self {
        Arg::Func(f)
    }
}

impl From<FlowRef> for Arg {
    fn from(f: FlowRef) -> Self {
        Arg::Flow(f)
    }
}

/// Positional and keyword arguments of one stage invocation.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: SmallVec<[Arg; 4]>,
    pub keywords: BTreeMap<String, Arg>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.positional.push(arg.into());
        self
    }

    pub fn value(self, v: impl Into<Value>) -> Self {
        self.arg(Arg::Value(v.into()))
    }

    pub fn func(self, f: Func) -> Self {
        self.arg(Arg::Func(f))
    }

    /// Sets a keyword argument.
    pub fn kw(mut self, name: impl Into<String>, arg: impl Into<Arg>) -> Self {
        self.keywords.insert(name.into(), arg.into());
        self
    }

    pub fn kw_value(self, name: impl Into<String>, v: impl Into<Value>) -> Self {
        self.kw(name, Arg::Value(v.into()))
    }

    pub fn kw_func(self, name: impl Into<String>, f: Func) -> Self {
        self.kw(name, Arg::Func(f))
    }

    pub fn len(&self) -> usize {
        self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keywords.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.positional.get(index)
    }

    pub fn get_kw(&self, name: &str) -> Option<&Arg> {
        self.keywords.get(name)
    }

    /// Inserts a positional argument, clamping the index to the end.
    pub fn insert(&mut self, index: usize, arg: Arg) {
        let at = index.min(self.positional.len());
        self.positional.insert(at, arg);
    }

    /// The flow at `index`. Stages receive their upstream here.
    pub fn flow(&self, index: usize) -> Result<FlowRef> {
        match self.positional.get(index) {
            Some(Arg::Flow(f)) => Ok(f.clone()),
            Some(other) => Err(PipeError::Type(format!(
                "argument {index} must be a flow, not {}",
                other.describe()
            ))),
            None => Err(PipeError::Index(format!("missing flow argument {index}"))),
        }
    }

    /// The callable at `index`.
    pub fn func_at(&self, index: usize) -> Result<Func> {
        self.func_opt(index)?
            .ok_or_else(|| PipeError::Index(format!("missing function argument {index}")))
    }

    /// The callable at `index`, treating a missing argument or `None` as absent.
    pub fn func_opt(&self, index: usize) -> Result<Option<Func>> {
        optional_func(self.positional.get(index), || format!("argument {index}"))
    }

    pub fn value_at(&self, index: usize) -> Result<Value> {
        match self.positional.get(index) {
            Some(Arg::Value(v)) => Ok(v.clone()),
            Some(other) => Err(PipeError::Type(format!(
                "argument {index} must be a value, not {}",
                other.describe()
            ))),
            None => Err(PipeError::Index(format!("missing argument {index}"))),
        }
    }

    pub fn opt_value(&self, index: usize) -> Result<Option<Value>> {
        match self.positional.get(index) {
            None => Ok(None),
            Some(_) => self.value_at(index).map(Some),
        }
    }

    pub fn kw_func_opt(&self, name: &str) -> Result<Option<Func>> {
        optional_func(self.keywords.get(name), || format!("keyword '{name}'"))
    }

    pub fn kw_value_opt(&self, name: &str) -> Result<Option<Value>> {
        match self.keywords.get(name) {
            None => Ok(None),
            Some(Arg::Value(v)) => Ok(Some(v.clone())),
            Some(other) => Err(PipeError::Type(format!(
                "keyword '{name}' must be a value, not {}",
                other.describe()
            ))),
        }
    }

    /// Positional arguments from `start` onward, all of which must be values.
    pub fn values_from(&self, start: usize) -> Result<Vec<Value>> {
        (start..self.positional.len())
            .map(|i| self.value_at(i))
            .collect()
    }
}

fn optional_func(arg: Option<&Arg>, what: impl FnOnce() -> String) -> Result<Option<Func>> {
    match arg {
        None => Ok(None),
        Some(Arg::Func(f)) => Ok(Some(f.clone())),
        Some(Arg::Value(Value::None)) => Ok(None),
        Some(other) => Err(PipeError::Type(format!(
            "{} must be callable, not {}",
            what(),
            other.describe()
        ))),
    }
}
