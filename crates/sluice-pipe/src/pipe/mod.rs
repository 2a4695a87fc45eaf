//! Fluent pipes.
//!
//! A [`Pipe`] is a source, a chain tip and two flags. Applying a stage never
//! mutates a pipe: it returns a new one sharing the same source, so every
//! prefix of a chain stays usable. Nothing is pulled until the pipe is
//! iterated or a terminal stage computes.

mod outcome;


use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sluice_core::{CallArgs, FlowRef, PipeError, Pull, Result, StageDef, StageKind, Value};
use tracing::debug;

use crate::assemble::assemble;
use crate::bypass::{Bypass, BypassDef, Drip};
use crate::confluence::{Confluence, PerStream, StreamHandle};
use crate::registry::{Entry, Registry};
use crate::reservoir::Reservoir;
use crate::valve::{Primed, Valve, ValveRef};

pub use outcome::Outcome;

#[derive(Clone)]
enum Source {
    Reservoir(Rc<RefCell<Reservoir>>),
    /// Root of a bypass sub-chain, fed by the enclosing pipe.
    Drip,
    Confluence(Confluence),
}

struct OpenBypass<'r> {
    def: Rc<BypassDef>,
    key: Option<Value>,
    drip: Rc<RefCell<Drip>>,
    enclosing: Pipe<'r>,
}

#[derive(Clone)]
pub struct Pipe<'r> {
    registry: &'r Registry,
    preloaded: bool,
    source: Source,
    tip: FlowRef,
    valve: Option<ValveRef>,
    bypass: Option<Rc<OpenBypass<'r>>>,
    /// Set on fan-out pipes, whose stages keep one copy per stream.
    streams: Option<Confluence>,
}

impl<'r> Pipe<'r> {
    pub(crate) fn with_reservoir(
        registry: &'r Registry,
        reservoir: Reservoir,
        preloaded: bool,
    ) -> Self {
        let reservoir = Rc::new(RefCell::new(reservoir));
        Self {
            registry,
            preloaded,
            tip: FlowRef::from_shared(reservoir.clone()),
            source: Source::Reservoir(reservoir),
            valve: None,
            bypass: None,
            streams: None,
        }
    }

    pub(crate) fn with_confluence(registry: &'r Registry, confluence: Confluence) -> Self {
        Self {
            registry,
            preloaded: false,
            tip: confluence.tap(),
            source: Source::Confluence(confluence.clone()),
            valve: None,
            bypass: None,
            streams: Some(confluence),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn is_preloaded(&self) -> bool {
        self.preloaded
    }

    /// Returns true when the tip is a terminal adapter.
    pub fn is_terminal(&self) -> bool {
        self.valve.is_some()
    }

    /// Returns true inside an open bypass.
    pub fn in_bypass(&self) -> bool {
        self.bypass.is_some()
    }

    pub fn tip(&self) -> &FlowRef {
        &self.tip
    }

    /// Applies the registered name `name` with `args`.
    ///
    /// Through stages and bypass operations return a new pipe. Terminal
    /// stages return a new terminal pipe, or the computed value when this
    /// pipe is preloaded.
    pub fn stage(&self, name: &str, args: CallArgs) -> Result<Outcome<'r>> {
        match self.registry.entry(name)? {
            Entry::Stage(def) => self.apply(def, args),
            Entry::BypassOpen(def) => {
                let key = args.opt_value(0)?;
                Ok(Outcome::Pipe(self.open_bypass(def.clone(), key)))
            }
            Entry::BypassClose(_) => self.close(name).map(Outcome::Pipe),
        }
    }

    /// Applies `name` without arguments.
    pub fn then(&self, name: &str) -> Result<Outcome<'r>> {
        self.stage(name, CallArgs::new())
    }

    /// Opens the bypass registered as `name`.
    pub fn open(&self, name: &str) -> Result<Pipe<'r>> {
        let def = self.opener(name)?;
        Ok(self.open_bypass(def, None))
    }

    /// Opens a keyed bypass such as `carry_dict[key]`.
    pub fn open_at(&self, name: &str, key: impl Into<Value>) -> Result<Pipe<'r>> {
        let def = self.opener(name)?;
        Ok(self.open_bypass(def, Some(key.into())))
    }

    /// Closes the open bypass with its closer `name`.
    pub fn close(&self, name: &str) -> Result<Pipe<'r>> {
        let Some(open) = &self.bypass else {
            debug!(event = "no_open_bypass", close = %name);
            return Err(PipeError::NoOpenBypass(name.to_string()));
        };
        if open.def.close_name.as_deref() != Some(name) {
            let expected = match &open.def.close_name {
                Some(close) => close.clone(),
                None => format!("the stage after {}", open.def.open_name),
            };
            debug!(
                event = "bypass_mismatch",
                open = %open.def.open_name,
                expected = %expected,
                actual = %name,
            );
            return Err(PipeError::BypassMismatch {
                open: open.def.open_name.clone(),
                expected,
                actual: name.to_string(),
            });
        }
        Ok(self.seal(open))
    }

    /// Feeds `data` to the source. A terminal pipe computes and returns its
    /// aggregate whole; any other pipe returns itself for iteration.
    pub fn run<I>(&self, data: I) -> Result<Outcome<'r>>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        self.fill(data)?;
        match &self.valve {
            Some(valve) => valve.whole_return().map(Outcome::Value),
            None => Ok(Outcome::Pipe(self.clone())),
        }
    }

    /// Refills the source without pulling anything.
    pub fn fill<I>(&self, data: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        match &self.source {
            Source::Reservoir(reservoir) => reservoir.borrow_mut().fill(data),
            Source::Drip => Err(PipeError::Config(
                "a bypass pipe is fed by its enclosing pipe; close the bypass first".to_string(),
            )),
            Source::Confluence(_) => Err(PipeError::Config(
                "a fan-out pipe is fed through stream handles".to_string(),
            )),
        }
    }

    /// Opens a new input stream on a fan-out pipe.
    pub fn stream(&self) -> Result<StreamHandle> {
        match &self.source {
            Source::Confluence(confluence) => Ok(StreamHandle::open(
                confluence.clone(),
                self.tip.clone(),
                self.valve.clone(),
            )),
            _ => Err(PipeError::Config(
                "streams are only available on fan-out pipes".to_string(),
            )),
        }
    }

    /// Opens a new input stream holding `data`.
    pub fn stream_with<I>(&self, data: I) -> Result<StreamHandle>
    where
        I: IntoIterator,
        I::Item: Into<Value> + 'static,
        I::IntoIter: 'static,
    {
        let handle = self.stream()?;
        handle.fill(data)?;
        Ok(handle)
    }

    /// Collects the current batch.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.tip.collect_items()
    }

    /// Discards the current batch.
    pub fn drain(&self) -> Result<()> {
        self.tip.drain()
    }

    fn apply(&self, def: &StageDef, args: CallArgs) -> Result<Outcome<'r>> {
        if let Some(confluence) = &self.streams {
            return self.apply_per_stream(confluence, def, args);
        }
        match &def.kind {
            StageKind::Through(build) => {
                let call = assemble(def, args, self.tip.clone())?;
                let tip = build(call)?;
                Ok(Outcome::Pipe(self.extend(tip, None)))
            }
            StageKind::Terminal(func) if self.preloaded => {
                let primed = Rc::new(RefCell::new(Primed::new(self.tip.clone())));
                let call = assemble(def, args, FlowRef::from_shared(primed.clone()))?;
                let value = func(&call);
                primed.borrow_mut().drain_rest()?;
                value.map(Outcome::Value)
            }
            StageKind::Terminal(func) => {
                let primed = Rc::new(RefCell::new(Primed::new(self.tip.clone())));
                let call = assemble(def, args, FlowRef::from_shared(primed.clone()))?;
                let valve = Valve::new(func.clone(), call, primed, def.empty_error);
                let valve = Rc::new(RefCell::new(valve));
                let tip = FlowRef::from_shared(valve.clone());
                Ok(Outcome::Pipe(
                    self.extend(tip, Some(ValveRef::Single(valve))),
                ))
            }
        }
    }

    /// Applies a stage on a fan-out pipe. Each stream pulls its own copy
    /// of the stage; one copy is built up front so argument errors surface
    /// here rather than on the first pull.
    fn apply_per_stream(
        &self,
        confluence: &Confluence,
        def: &StageDef,
        args: CallArgs,
    ) -> Result<Outcome<'r>> {
        let def = def.clone();
        let upstream = self.tip.clone();
        match def.kind.clone() {
            StageKind::Through(build) => {
                let make = move || build(assemble(&def, args.clone(), upstream.clone())?);
                make()?;
                let copies = PerStream::new(confluence.clone(), make);
                Ok(Outcome::Pipe(self.extend(FlowRef::new(copies), None)))
            }
            StageKind::Terminal(func) => {
                let make = move || -> Result<Rc<RefCell<Valve>>> {
                    let primed = Rc::new(RefCell::new(Primed::new(upstream.clone())));
                    let upstream = FlowRef::from_shared(primed.clone());
                    let call = assemble(&def, args.clone(), upstream)?;
                    let valve = Valve::new(func.clone(), call, primed, def.empty_error);
                    Ok(Rc::new(RefCell::new(valve)))
                };
                make()?;
                let copies = Rc::new(RefCell::new(PerStream::new(confluence.clone(), make)));
                let tip = FlowRef::from_shared(copies.clone());
                Ok(Outcome::Pipe(
                    self.extend(tip, Some(ValveRef::PerStream(copies))),
                ))
            }
        }
    }

    /// A pipe with a new tip; single-stage bypasses close here.
    fn extend(&self, tip: FlowRef, valve: Option<ValveRef>) -> Pipe<'r> {
        let pipe = Pipe {
            tip,
            valve,
            ..self.clone()
        };
        match self.bypass.as_deref() {
            Some(open) if open.def.is_single() => pipe.seal(open),
            _ => pipe,
        }
    }

    fn opener(&self, name: &str) -> Result<Rc<BypassDef>> {
        match self.registry.entry(name)? {
            Entry::BypassOpen(def) => Ok(def.clone()),
            _ => Err(PipeError::Config(format!("{name} does not open a bypass"))),
        }
    }

    fn open_bypass(&self, def: Rc<BypassDef>, key: Option<Value>) -> Pipe<'r> {
        let drip = match &self.streams {
            Some(confluence) => Drip::per_stream(confluence.clone()),
            None => Drip::new(),
        };
        let drip = Rc::new(RefCell::new(drip));
        Pipe {
            registry: self.registry,
            preloaded: false,
            source: Source::Drip,
            tip: FlowRef::from_shared(drip.clone()),
            valve: None,
            bypass: Some(Rc::new(OpenBypass {
                def,
                key,
                drip,
                enclosing: self.clone(),
            })),
            streams: self.streams.clone(),
        }
    }

    /// Joins this bypass sub-chain back into its enclosing pipe.
    fn seal(&self, open: &OpenBypass<'r>) -> Pipe<'r> {
        let inner = self.tip.clone();
        let outer = open.enclosing.tip.clone();
        let drip = open.drip.clone();
        let def = open.def.clone();
        let key = open.key.clone();
        let make = move || {
            FlowRef::new(Bypass::new(
                inner.clone(),
                outer.clone(),
                drip.clone(),
                def.clone(),
                key.clone(),
            ))
        };
        let tip = match &self.streams {
            Some(confluence) => {
                FlowRef::new(PerStream::new(confluence.clone(), move || Ok(make())))
            }
            None => make(),
        };
        Pipe {
            tip,
            valve: None,
            ..open.enclosing.clone()
        }
    }
}

impl Iterator for Pipe<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.tip.pull() {
            Ok(Pull::Item(v)) => Some(Ok(v)),
            Ok(Pull::Dry | Pull::Done) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl fmt::Debug for Pipe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipe")
            .field("preloaded", &self.preloaded)
            .field("terminal", &self.is_terminal())
            .field(
                "bypass",
                &self.bypass.as_ref().map(|b| b.def.open_name.as_str()),
            )
            .field("tip", &self.tip)
            .finish()
    }
}
