use sluice_core::{CallArgs, PipeError, Result, Value};

use super::Pipe;

/// Result of applying a stage: a further pipe, or the value a preloaded
/// pipe computed.
#[derive(Debug, Clone)]
pub enum Outcome<'r> {
    Value(Value),
    Pipe(Pipe<'r>),
}

impl<'r> Outcome<'r> {
    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    pub fn into_pipe(self) -> Result<Pipe<'r>> {
        match self {
            Outcome::Pipe(pipe) => Ok(pipe),
            Outcome::Value(v) => Err(PipeError::Type(format!(
                "expected a pipe, got the computed value {}",
                v.repr()
            ))),
        }
    }

    pub fn into_value(self) -> Result<Value> {
        match self {
            Outcome::Value(v) => Ok(v),
            Outcome::Pipe(_) => Err(PipeError::Type(
                "expected a computed value, got a pipe".to_string(),
            )),
        }
    }

    pub fn stage(self, name: &str, args: CallArgs) -> Result<Outcome<'r>> {
        self.into_pipe()?.stage(name, args)
    }

    pub fn then(self, name: &str) -> Result<Outcome<'r>> {
        self.into_pipe()?.then(name)
    }

    pub fn open(self, name: &str) -> Result<Pipe<'r>> {
        self.into_pipe()?.open(name)
    }

    pub fn open_at(self, name: &str, key: impl Into<Value>) -> Result<Pipe<'r>> {
        self.into_pipe()?.open_at(name, key)
    }

    pub fn close(self, name: &str) -> Result<Pipe<'r>> {
        self.into_pipe()?.close(name)
    }

    pub fn run<I>(self, data: I) -> Result<Outcome<'r>>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        self.into_pipe()?.run(data)
    }

    /// Collects the current batch of a pipe outcome.
    pub fn values(self) -> Result<Vec<Value>> {
        self.into_pipe()?.values()
    }
}

impl<'r> From<Pipe<'r>> for Outcome<'r> {
    fn from(pipe: Pipe<'r>) -> Self {
        Outcome::Pipe(pipe)
    }
}
