//! Refillable single-slot source.

use std::iter::Peekable;

use sluice_core::{Flow, PipeError, Pull, Result, Value};
use tracing::debug;

type Cursor = Peekable<Box<dyn Iterator<Item = Value>>>;

/// The entry point of a pipe.
///
/// Holds at most one cursor. Refilling while the cursor still has elements
/// is a reuse violation; exhausting it clears the slot.
#[derive(Default)]
pub struct Reservoir {
    cursor: Option<Cursor>,
}

impl Reservoir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reservoir already holding `data`.
    pub fn filled<I>(data: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        Self {
            cursor: Some(cursor(data)),
        }
    }

    /// Installs a fresh cursor over `data`.
    pub fn fill<I>(&mut self, data: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        if !self.is_empty() {
            debug!(event = "refill_refused");
            return Err(PipeError::NotEmpty("Reservoir".to_string()));
        }
        self.cursor = Some(cursor(data));
        Ok(())
    }

    /// Returns true when no element is pending. Peeks the cursor.
    pub fn is_empty(&mut self) -> bool {
        match self.cursor.as_mut() {
            Some(c) => c.peek().is_none(),
            None => true,
        }
    }

    /// Drops any pending elements.
    pub fn clear(&mut self) {
        self.cursor = None;
    }
}

fn cursor<I>(data: I) -> Cursor
where
    I: IntoIterator,
    I::Item: Into<Value> + 'static,
    I::IntoIter: 'static,
{
    let iter: Box<dyn Iterator<Item = Value>> = Box::new(data.into_iter().map(Into::into));
    iter.peekable()
}

impl Flow for Reservoir {
    fn pull(&mut self) -> Result<Pull> {
        match self.cursor.as_mut().and_then(Iterator::next) {
            Some(v) => Ok(Pull::Item(v)),
            None => {
                self.cursor = None;
                Ok(Pull::Done)
            }
        }
    }
}
