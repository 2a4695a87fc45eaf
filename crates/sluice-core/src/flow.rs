//! Pull-based flows.
//!
//! A flow yields [`Pull::Item`] until its current batch of input is used up,
//! then [`Pull::Done`]. A flow may be pulled again after `Done`; if its
//! source has been refilled in the meantime it yields the new batch. This
//! is what makes a pipeline re-entrant.
//!
//! [`Pull::Dry`] is the "nothing right now" signal raised by a drip source.
//! Stages propagate it unchanged and keep their state, the same way a
//! future returns `Poll::Pending`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::value::Value;

/// Outcome of pulling a flow once.
#[derive(Debug, Clone, PartialEq)]
pub enum Pull {
    Item(Value),
    /// The source holds nothing right now; state is kept.
    Dry,
    /// The current batch is finished.
    Done,
}

impl Pull {
    pub fn into_item(self) -> Option<Value> {
        match self {
            Pull::Item(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Pull::Item(_))
    }

    pub fn is_dry(&self) -> bool {
        matches!(self, Pull::Dry)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Pull::Done)
    }
}

/// A lazily evaluated sequence of values.
pub trait Flow {
    fn pull(&mut self) -> Result<Pull>;
}

/// Shared handle to a flow.
///
/// Stages hold their upstream through this handle; several pipes built from
/// the same prefix share the prefix's flows.
#[derive(Clone)]
pub struct FlowRef(Rc<RefCell<dyn Flow>>);

impl FlowRef {
    pub fn new<F: Flow + 'static>(flow: F) -> Self {
        Self(Rc::new(RefCell::new(flow)))
    }

    /// Wraps a flow the caller also keeps a typed handle to.
    pub fn from_shared<F: Flow + 'static>(shared: Rc<RefCell<F>>) -> Self {
        Self(shared)
    }

    pub fn pull(&self) -> Result<Pull> {
        self.0.borrow_mut().pull()
    }

    /// Iterates the current batch. Stops on `Done` or `Dry`.
    pub fn items(&self) -> Items {
        Items {
            flow: self.clone(),
            finished: false,
        }
    }

    /// Collects the current batch.
    pub fn collect_items(&self) -> Result<Vec<Value>> {
        self.items().collect()
    }

    /// Pulls until the current batch is finished, discarding items.
    pub fn drain(&self) -> Result<()> {
        loop {
            match self.pull()? {
                Pull::Item(_) => continue,
                Pull::Dry | Pull::Done => return Ok(()),
            }
        }
    }

    pub fn ptr_eq(&self, other: &FlowRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for FlowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowRef({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Iterator over the current batch of a flow.
pub struct Items {
    flow: FlowRef,
    finished: bool,
}

impl Iterator for Items {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.flow.pull() {
            Ok(Pull::Item(v)) => Some(Ok(v)),
            Ok(Pull::Dry | Pull::Done) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// One-shot flow over a Rust iterator. Reports `Done` forever once exhausted.
pub struct IterFlow {
    iter: Box<dyn Iterator<Item = Result<Value>>>,
}

impl IterFlow {
    pub fn new(iter: impl Iterator<Item = Result<Value>> + 'static) -> Self {
        Self {
            iter: Box::new(iter.fuse()),
        }
    }

    pub fn values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::new(values.into_iter().map(Ok))
    }
}

impl Flow for IterFlow {
    fn pull(&mut self) -> Result<Pull> {
        match self.iter.next() {
            Some(item) => item.map(Pull::Item),
            None => Ok(Pull::Done),
        }
    }
}

/// Flow driven by a closure.
pub struct FnFlow<F> {
    f: F,
}

impl<F> FnFlow<F>
where
    F: FnMut() -> Result<Pull>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Flow for FnFlow<F>
where
    F: FnMut() -> Result<Pull>,
{
    fn pull(&mut self) -> Result<Pull> {
        (self.f)()
    }
}

/// Creates a flow from a closure returning one [`Pull`] per call.
pub fn from_fn<F>(f: F) -> FlowRef
where
    F: FnMut() -> Result<Pull> + 'static,
{
    FlowRef::new(FnFlow::new(f))
}

/// Builds a fresh per-batch flow over an upstream.
pub type Build = Rc<dyn Fn(FlowRef) -> Result<Box<dyn Flow>>>;

/// Makes a one-shot flow re-entrant.
///
/// The inner flow is built on first pull and discarded after it reports
/// `Done`; the next pull builds a new one over the same upstream. `Dry`
/// keeps the inner flow alive.
pub struct Regenerate {
    upstream: FlowRef,
    build: Build,
    current: Option<Box<dyn Flow>>,
}

impl Regenerate {
    pub fn new(upstream: FlowRef, build: Build) -> Self {
        Self {
            upstream,
            build,
            current: None,
        }
    }
}

impl Flow for Regenerate {
    fn pull(&mut self) -> Result<Pull> {
        if self.current.is_none() {
            self.current = Some((self.build)(self.upstream.clone())?);
        }
        let pulled = match self.current.as_mut() {
            Some(flow) => flow.pull(),
            None => Ok(Pull::Done),
        };
        if !matches!(pulled, Ok(Pull::Item(_)) | Ok(Pull::Dry)) {
            self.current = None;
        }
        pulled
    }
}
