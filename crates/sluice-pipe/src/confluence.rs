//! Multi-stream fan-out.
//!
//! A [`Confluence`] keeps one private [`Reservoir`] per stream handle. The
//! shared chain reads through a tap that follows whichever handle is
//! currently pulling. Stages on the chain are `PerStream` dispatchers
//! holding one copy of the stage per handle, so stage state never crosses
//! streams.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use sluice_core::{Flow, FlowRef, PipeError, Pull, Result, Value};
use tracing::debug;

use crate::reservoir::Reservoir;
use crate::valve::{Valve, ValveRef};

/// Opaque identity of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

#[derive(Default)]
struct State {
    reservoirs: HashMap<HandleId, Reservoir>,
    next_id: u64,
    current: Option<HandleId>,
}

/// Shared source of a fan-out pipe.
#[derive(Clone, Default)]
pub struct Confluence {
    state: Rc<RefCell<State>>,
}

impl Confluence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flow reading the reservoir of the handle currently pulling.
    pub fn tap(&self) -> FlowRef {
        FlowRef::new(Tap {
            state: self.state.clone(),
        })
    }

    /// Number of live stream handles.
    pub fn streams(&self) -> usize {
        self.state.borrow().reservoirs.len()
    }

    fn open(&self) -> HandleId {
        let mut state = self.state.borrow_mut();
        let id = HandleId(state.next_id);
        state.next_id += 1;
        state.reservoirs.insert(id, Reservoir::new());
        debug!(event = "stream_open", id = id.0);
        id
    }

    /// The handle currently pulling, if any.
    pub(crate) fn current(&self) -> Option<HandleId> {
        self.state.borrow().current
    }

    pub(crate) fn is_open(&self, id: HandleId) -> bool {
        self.state.borrow().reservoirs.contains_key(&id)
    }

    fn fill<I>(&self, id: HandleId, data: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        let mut state = self.state.borrow_mut();
        let reservoir = state
            .reservoirs
            .get_mut(&id)
            .ok_or_else(|| PipeError::Config(format!("stream {} was released", id.0)))?;
        reservoir.fill(data)
    }

    fn release(&self, id: HandleId) {
        let mut state = self.state.borrow_mut();
        state.reservoirs.remove(&id);
        if state.current == Some(id) {
            state.current = None;
        }
        debug!(event = "stream_release", id = id.0);
    }

    /// Runs `f` with `id` as the pulling handle.
    fn with_current<T>(&self, id: HandleId, f: impl FnOnce() -> T) -> T {
        let previous = self.state.borrow_mut().current.replace(id);
        let out = f();
        self.state.borrow_mut().current = previous;
        out
    }
}

/// One copy of a stage per stream handle, built on the handle's first
/// pull and dropped once the handle is released.
pub(crate) struct PerStream<T> {
    confluence: Confluence,
    build: Box<dyn Fn() -> Result<T>>,
    copies: HashMap<HandleId, T>,
}

impl<T: Clone> PerStream<T> {
    pub(crate) fn new(confluence: Confluence, build: impl Fn() -> Result<T> + 'static) -> Self {
        Self {
            confluence,
            build: Box::new(build),
            copies: HashMap::new(),
        }
    }

    /// The copy serving the handle currently pulling.
    pub(crate) fn copy(&mut self) -> Result<Option<T>> {
        let Some(id) = self.confluence.current() else {
            return Ok(None);
        };
        if let Some(copy) = self.copies.get(&id) {
            return Ok(Some(copy.clone()));
        }
        let copy = (self.build)()?;
        let confluence = &self.confluence;
        self.copies.retain(|id, _| confluence.is_open(*id));
        self.copies.insert(id, copy.clone());
        Ok(Some(copy))
    }
}

impl Flow for PerStream<FlowRef> {
    fn pull(&mut self) -> Result<Pull> {
        match self.copy()? {
            Some(flow) => flow.pull(),
            None => Ok(Pull::Done),
        }
    }
}

impl Flow for PerStream<Rc<RefCell<Valve>>> {
    fn pull(&mut self) -> Result<Pull> {
        match self.copy()? {
            Some(valve) => valve.borrow_mut().pull(),
            None => Ok(Pull::Done),
        }
    }
}

struct Tap {
    state: Rc<RefCell<State>>,
}

impl Flow for Tap {
    fn pull(&mut self) -> Result<Pull> {
        let mut state = self.state.borrow_mut();
        let Some(id) = state.current else {
            return Ok(Pull::Done);
        };
        match state.reservoirs.get_mut(&id) {
            Some(reservoir) => reservoir.pull(),
            None => Ok(Pull::Done),
        }
    }
}

/// One input stream of a fan-out pipe.
///
/// Owns a private source slot; dropping the handle releases it.
pub struct StreamHandle {
    id: HandleId,
    confluence: Confluence,
    tip: FlowRef,
    valve: Option<ValveRef>,
}

impl StreamHandle {
    pub(crate) fn open(confluence: Confluence, tip: FlowRef, valve: Option<ValveRef>) -> Self {
        let id = confluence.open();
        Self {
            id,
            confluence,
            tip,
            valve,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Refills this stream's source.
    pub fn fill<I>(&self, data: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        self.confluence.fill(self.id, data)
    }

    /// Pulls the shared chain once on behalf of this stream.
    pub fn pull(&self) -> Result<Pull> {
        self.confluence.with_current(self.id, || self.tip.pull())
    }

    /// Computes the terminal aggregate over this stream's pending data.
    pub fn value(&self) -> Result<Value> {
        let valve = self
            .valve
            .as_ref()
            .ok_or_else(|| PipeError::Config("stream pipe has no terminal stage".to_string()))?;
        self.confluence
            .with_current(self.id, || valve.whole_return())
    }

    /// Collects the current batch of this stream.
    pub fn values(&self) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        while let Pull::Item(v) = self.pull()? {
            out.push(v);
        }
        Ok(out)
    }
}

impl Iterator for StreamHandle {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match StreamHandle::pull(self) {
            Ok(Pull::Item(v)) => Some(Ok(v)),
            Ok(Pull::Dry | Pull::Done) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.confluence.release(self.id);
    }
}
