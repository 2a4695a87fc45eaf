//! Side channel coupling.
//!
//! A bypass splits each outer element into a carried value and a payload,
//! feeds the payload through a sub-chain rooted at a [`Drip`] and merges
//! every sub-chain result with the carried value. A sub-chain that drops
//! the payload drops the carried value with it; one that expands the
//! payload pairs the same carried value with each result.

mod drip;
pub mod methods;


use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sluice_core::{Flow, FlowRef, Pull, Result, Value};

pub use drip::Drip;

/// Splits an outer element into `(carried, payload)`. The second argument is
/// the key given when the bypass was opened.
pub type SplitFn = Rc<dyn Fn(Value, Option<&Value>) -> Result<(Value, Value)>>;

/// Merges `(carried, result)` back into one element.
pub type MergeFn = Rc<dyn Fn(Value, Value, Option<&Value>) -> Result<Value>>;

/// A named bypass kind.
///
/// Without a close name the bypass spans exactly one stage and closes
/// itself after it.
#[derive(Clone)]
pub struct BypassDef {
    pub open_name: String,
    pub close_name: Option<String>,
    pub split: SplitFn,
    pub merge: MergeFn,
}

impl BypassDef {
    /// A single-stage bypass.
    pub fn new(
        open_name: impl Into<String>,
        split: impl Fn(Value, Option<&Value>) -> Result<(Value, Value)> + 'static,
        merge: impl Fn(Value, Value, Option<&Value>) -> Result<Value> + 'static,
    ) -> Self {
        Self {
            open_name: open_name.into(),
            close_name: None,
            split: Rc::new(split),
            merge: Rc::new(merge),
        }
    }

    /// Makes the bypass span stages until `close_name` is applied.
    pub fn closed_by(mut self, close_name: impl Into<String>) -> Self {
        self.close_name = Some(close_name.into());
        self
    }

    pub fn is_single(&self) -> bool {
        self.close_name.is_none()
    }
}

impl fmt::Debug for BypassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BypassDef")
            .field("open_name", &self.open_name)
            .field("close_name", &self.close_name)
            .finish()
    }
}

/// Flow recombining a sub-chain with the values carried around it.
pub struct Bypass {
    inner: FlowRef,
    outer: FlowRef,
    drip: Rc<RefCell<Drip>>,
    def: Rc<BypassDef>,
    key: Option<Value>,
    store: Option<Value>,
}

impl Bypass {
    /// `inner` must be rooted at `drip`.
    pub fn new(
        inner: FlowRef,
        outer: FlowRef,
        drip: Rc<RefCell<Drip>>,
        def: Rc<BypassDef>,
        key: Option<Value>,
    ) -> Self {
        Self {
            inner,
            outer,
            drip,
            def,
            key,
            store: None,
        }
    }

    fn reset(&mut self) {
        self.store = None;
        self.drip.borrow_mut().clear();
    }
}

impl Flow for Bypass {
    fn pull(&mut self) -> Result<Pull> {
        loop {
            match self.inner.pull()? {
                Pull::Item(result) => {
                    let carried = self.store.clone().unwrap_or_default();
                    let merged = (self.def.merge)(carried, result, self.key.as_ref())?;
                    return Ok(Pull::Item(merged));
                }
                Pull::Done => {
                    // the sub-chain stopped early; finish the outer batch
                    self.outer.drain()?;
                    self.reset();
                    return Ok(Pull::Done);
                }
                Pull::Dry => {}
            }

            match self.outer.pull()? {
                Pull::Item(item) => {
                    let (carried, payload) = (self.def.split)(item, self.key.as_ref())?;
                    self.store = Some(carried);
                    self.drip.borrow_mut().fill(payload);
                }
                Pull::Done => {
                    self.reset();
                    return Ok(Pull::Done);
                }
                Pull::Dry => return Ok(Pull::Dry),
            }
        }
    }
}
