//! Caller supplied callables.
//!
//! A [`Func`] declares its parameters explicitly. Spread wrapping
//! (`star_wrap` / `double_star_wrap`) consults the declaration instead of
//! inspecting the closure.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{PipeError, Result};
use crate::value::Value;

type Body = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// Parameter declaration of a [`Func`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Positional parameters, by count.
    Count(usize),
    /// Named parameters, in positional order.
    Named(Vec<Arc<str>>),
}

impl Params {
    pub fn len(&self) -> usize {
        match self {
            Params::Count(n) => *n,
            Params::Named(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named callable over values.
#[derive(Clone)]
pub struct Func {
    name: Arc<str>,
    params: Params,
    body: Body,
}

impl Func {
    /// Creates a callable taking `arity` positional values.
    pub fn new(
        name: impl AsRef<str>,
        arity: usize,
        f: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            params: Params::Count(arity),
            body: Rc::new(f),
        }
    }

    /// Creates a callable with named parameters. Names are used when a
    /// mapping is spread into the call.
    pub fn named(
        name: impl AsRef<str>,
        params: &[&str],
        f: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            params: Params::Named(params.iter().map(|p| Arc::from(*p)).collect()),
            body: Rc::new(f),
        }
    }

    /// Creates a one parameter callable.
    pub fn unary(name: impl AsRef<str>, f: impl Fn(&Value) -> Result<Value> + 'static) -> Self {
        Self::new(name, 1, move |args| f(&args[0]))
    }

    /// Creates a two parameter callable.
    pub fn binary(
        name: impl AsRef<str>,
        f: impl Fn(&Value, &Value) -> Result<Value> + 'static,
    ) -> Self {
        Self::new(name, 2, move |args| f(&args[0], &args[1]))
    }

    /// Creates an infallible one parameter predicate.
    pub fn predicate(name: impl AsRef<str>, f: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::new(name, 1, move |args| Ok(Value::Bool(f(&args[0]))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns true when spread wrapping applies to this callable.
    pub fn is_spreadable(&self) -> bool {
        self.arity() > 1
    }

    /// Calls with exactly the declared number of positional values.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        if args.len() != self.arity() {
            return Err(PipeError::Type(format!(
                "{}() takes {} positional arguments but {} were given",
                self.name,
                self.arity(),
                args.len()
            )));
        }
        (self.body)(args)
    }

    /// Calls with a single value.
    pub fn call1(&self, value: &Value) -> Result<Value> {
        self.call(std::slice::from_ref(value))
    }

    /// Calls with a single value and reports the truthiness of the result.
    pub fn test(&self, value: &Value) -> Result<bool> {
        Ok(self.call1(value)?.truthy())
    }

    /// Wraps this callable so it takes one iterable whose items become the
    /// positional arguments.
    pub fn star(&self) -> Func {
        let inner = self.clone();
        Func::new(format!("*{}", self.name), 1, move |args| {
            let spread = args[0].items()?;
            inner.call(&spread)
        })
    }

    /// Wraps this callable so it takes one mapping whose entries are matched
    /// to the declared parameter names.
    pub fn double_star(&self) -> Result<Func> {
        let names = match &self.params {
            Params::Named(names) => names.clone(),
            Params::Count(_) => {
                return Err(PipeError::Type(format!(
                    "{}() declares no parameter names to receive a mapping",
                    self.name
                )))
            }
        };
        let inner = self.clone();
        Ok(Func::new(format!("**{}", self.name), 1, move |args| {
            let mapping = args[0].as_dict().ok_or_else(|| {
                PipeError::Type(format!(
                    "{}() argument after ** must be a mapping, not {}",
                    inner.name,
                    args[0].type_name()
                ))
            })?;
            if let Some(extra) = mapping
                .keys()
                .find(|k| !names.iter().any(|n| k.as_str() == Some(n.as_ref())))
            {
                return Err(PipeError::Type(format!(
                    "{}() got an unexpected keyword argument {}",
                    inner.name,
                    extra.repr()
                )));
            }
            let values = names
                .iter()
                .map(|n| {
                    mapping.get(&Value::str(n)).cloned().ok_or_else(|| {
                        PipeError::Type(format!(
                            "{}() missing required argument: '{}'",
                            inner.name, n
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            inner.call(&values)
        }))
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}
