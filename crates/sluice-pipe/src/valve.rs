//! Terminal adapter.
//!
//! A [`Valve`] turns an aggregate into something pulled like any other
//! flow. Each cycle it computes the aggregate once over the whole upstream
//! batch and emits it piecewise when it is iterable, atomically otherwise.

use std::cell::RefCell;
use std::rc::Rc;

use sluice_core::{
    CallArgs, ErrorKind, Flow, FlowRef, PipeError, Pull, Result, TerminalFn, Value,
};
use tracing::trace;

use crate::confluence::PerStream;

/// Upstream wrapper of a terminal aggregate.
///
/// The valve pulls once before computing so it can tell an exhausted
/// upstream from a fresh batch; that result is held back and replayed to
/// the aggregate. The wrapper also records whether the aggregate reached the
/// end of the batch, so leftovers are drained exactly once.
pub struct Primed {
    inner: FlowRef,
    held: Option<Pull>,
    finished: bool,
}

impl Primed {
    pub fn new(inner: FlowRef) -> Self {
        Self {
            inner,
            held: None,
            finished: false,
        }
    }

    /// Pulls one result and holds it back for the next pull.
    fn prime(&mut self) -> Result<Pull> {
        let pulled = self.inner.pull()?;
        self.held = Some(pulled.clone());
        self.finished = false;
        Ok(pulled)
    }

    /// Forgets the held result.
    fn discard(&mut self) {
        self.held = None;
    }

    /// Starts a computation without priming.
    fn begin(&mut self) {
        self.finished = false;
    }

    /// Pulls whatever the aggregate left of the current batch.
    pub fn drain_rest(&mut self) -> Result<()> {
        while !self.finished {
            self.pull()?;
        }
        Ok(())
    }
}

impl Flow for Primed {
    fn pull(&mut self) -> Result<Pull> {
        let pulled = match self.held.take() {
            Some(p) => p,
            None => self.inner.pull()?,
        };
        if !pulled.is_item() {
            self.finished = true;
        }
        Ok(pulled)
    }
}

pub struct Valve {
    func: TerminalFn,
    call: CallArgs,
    upstream: Rc<RefCell<Primed>>,
    empty_error: Option<ErrorKind>,
    post: std::vec::IntoIter<Value>,
    /// The current cycle's aggregate has been computed.
    emitted: bool,
}

impl Valve {
    /// `call` must already hold a flow over `upstream` at the stage's
    /// upstream position.
    pub fn new(
        func: TerminalFn,
        call: CallArgs,
        upstream: Rc<RefCell<Primed>>,
        empty_error: Option<ErrorKind>,
    ) -> Self {
        Self {
            func,
            call,
            upstream,
            empty_error,
            post: Vec::new().into_iter(),
            emitted: false,
        }
    }

    /// Computes the aggregate and returns it whole, draining whatever the
    /// aggregate left in the upstream.
    pub fn whole_return(&mut self) -> Result<Value> {
        self.post = Vec::new().into_iter();
        self.upstream.borrow_mut().begin();
        let result = (self.func)(&self.call);
        self.upstream.borrow_mut().drain_rest()?;
        self.emitted = result.is_ok();
        result
    }

    fn is_empty_error(&self, kind: ErrorKind) -> bool {
        self.empty_error == Some(kind)
    }
}

impl Flow for Valve {
    fn pull(&mut self) -> Result<Pull> {
        if let Some(v) = self.post.next() {
            return Ok(Pull::Item(v));
        }

        let first = self.upstream.borrow_mut().prime()?;
        match first {
            Pull::Item(_) => {}
            Pull::Dry => {
                self.upstream.borrow_mut().discard();
                self.emitted = false;
                return Ok(Pull::Dry);
            }
            Pull::Done if self.emitted => {
                self.upstream.borrow_mut().discard();
                self.emitted = false;
                return Ok(Pull::Done);
            }
            Pull::Done => {}
        }

        let result = match (self.func)(&self.call) {
            Ok(v) => v,
            Err(e) if self.is_empty_error(e.kind()) => {
                trace!(event = "empty_input", error = %e);
                self.upstream.borrow_mut().drain_rest()?;
                self.emitted = false;
                return Ok(Pull::Done);
            }
            Err(e) => return Err(e),
        };
        self.upstream.borrow_mut().drain_rest()?;
        self.emitted = true;

        if result.is_iterable() {
            self.post = result.into_items()?.into_iter();
            Ok(self.post.next().map_or(Pull::Done, Pull::Item))
        } else {
            Ok(Pull::Item(result))
        }
    }
}

/// The terminal adapter at a pipe's tip.
#[derive(Clone)]
pub(crate) enum ValveRef {
    Single(Rc<RefCell<Valve>>),
    /// One valve per stream of a fan-out pipe.
    PerStream(Rc<RefCell<PerStream<Rc<RefCell<Valve>>>>>),
}

impl ValveRef {
    pub(crate) fn whole_return(&self) -> Result<Value> {
        let valve = match self {
            ValveRef::Single(valve) => valve.clone(),
            ValveRef::PerStream(copies) => match copies.borrow_mut().copy()? {
                Some(valve) => valve,
                None => {
                    return Err(PipeError::Config(
                        "a fan-out pipe computes through its stream handles".to_string(),
                    ))
                }
            },
        };
        let result = valve.borrow_mut().whole_return();
        result
    }
}

#[cfg(test)]
mod tests;
