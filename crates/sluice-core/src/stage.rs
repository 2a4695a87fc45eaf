//! Stage descriptors.
//!
//! A [`StageDef`] describes one fluent stage: the function that builds its
//! flow (or computes its aggregate), where the upstream flow is spliced into
//! the call arguments, and how caller supplied callables are spread. A
//! [`MapDef`] describes a one-argument element mapping. An [`AddIn`] groups
//! both under a loadable name.

use std::fmt;
use std::rc::Rc;

use crate::args::CallArgs;
use crate::error::{ErrorKind, PipeError, Result};
use crate::flow::FlowRef;
use crate::value::Value;

/// Builds a lazy flow from assembled arguments. Must not pull anything.
pub type ThroughFn = Rc<dyn Fn(CallArgs) -> Result<FlowRef>>;

/// Computes an aggregate from assembled arguments, consuming the upstream
/// flow found among them.
pub type TerminalFn = Rc<dyn Fn(&CallArgs) -> Result<Value>>;

/// Maps one element. The element is positional argument 0; extra call
/// arguments follow it.
pub type MapFn = Rc<dyn Fn(&CallArgs) -> Result<Value>>;

/// Through or terminal implementation of a stage.
#[derive(Clone)]
pub enum StageKind {
    Through(ThroughFn),
    Terminal(TerminalFn),
}

/// The caller argument designated by a spread directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum WrapTarget {
    /// Position in the final argument list, counting the upstream slot.
    Index(usize),
    /// Keyword name.
    Name(String),
}

impl From<usize> for WrapTarget {
    fn from(i: usize) -> Self {
        WrapTarget::Index(i)
    }
}

impl From<&str> for WrapTarget {
    fn from(name: &str) -> Self {
        WrapTarget::Name(name.to_string())
    }
}

impl fmt::Display for WrapTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapTarget::Index(i) => write!(f, "{i}"),
            WrapTarget::Name(n) => write!(f, "'{n}'"),
        }
    }
}

/// A resolved spread directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spread {
    Star(WrapTarget),
    DoubleStar(WrapTarget),
}

/// What happens when a registered name already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverwritePolicy {
    /// Collisions fail with a registration conflict.
    #[default]
    Protect,
    /// Later registrations replace earlier ones.
    Replace,
}

/// Descriptor of a through or terminal stage.
#[derive(Clone)]
pub struct StageDef {
    pub name: String,
    pub kind: StageKind,
    /// Position of the upstream flow in the final arguments.
    pub iter_index: usize,
    /// Refuse to replace an existing entry of the same name.
    pub no_over_write: bool,
    /// Error kind a terminal stage raises on empty input.
    pub empty_error: Option<ErrorKind>,
    pub star_wrap: Option<WrapTarget>,
    pub double_star_wrap: Option<WrapTarget>,
}

impl StageDef {
    fn with_kind(name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            iter_index: 0,
            no_over_write: true,
            empty_error: None,
            star_wrap: None,
            double_star_wrap: None,
        }
    }

    /// A lazy many-in/many-out stage.
    pub fn through(
        name: impl Into<String>,
        f: impl Fn(CallArgs) -> Result<FlowRef> + 'static,
    ) -> Self {
        Self::with_kind(name, StageKind::Through(Rc::new(f)))
    }

    /// An aggregate stage consuming its whole input.
    pub fn terminal(
        name: impl Into<String>,
        f: impl Fn(&CallArgs) -> Result<Value> + 'static,
    ) -> Self {
        Self::with_kind(name, StageKind::Terminal(Rc::new(f)))
    }

    pub fn iter_index(mut self, index: usize) -> Self {
        self.iter_index = index;
        self
    }

    /// Registers under a different name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn allow_overwrite(mut self) -> Self {
        self.no_over_write = false;
        self
    }

    pub fn empty_error(mut self, kind: ErrorKind) -> Self {
        self.empty_error = Some(kind);
        self
    }

    pub fn star_wrap(mut self, target: impl Into<WrapTarget>) -> Self {
        self.star_wrap = Some(target.into());
        self
    }

    pub fn double_star_wrap(mut self, target: impl Into<WrapTarget>) -> Self {
        self.double_star_wrap = Some(target.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StageKind::Terminal(_))
    }

    /// The configured spread directive; setting both is a configuration error.
    pub fn spread(&self) -> Result<Option<Spread>> {
        match (&self.star_wrap, &self.double_star_wrap) {
            (Some(_), Some(_)) => Err(PipeError::Config(format!(
                "stage '{}' sets both star_wrap and double_star_wrap",
                self.name
            ))),
            (Some(t), None) => Ok(Some(Spread::Star(t.clone()))),
            (None, Some(t)) => Ok(Some(Spread::DoubleStar(t.clone()))),
            (None, None) => Ok(None),
        }
    }
}

impl fmt::Debug for StageDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDef")
            .field("name", &self.name)
            .field("terminal", &self.is_terminal())
            .field("iter_index", &self.iter_index)
            .field("no_over_write", &self.no_over_write)
            .field("empty_error", &self.empty_error)
            .field("star_wrap", &self.star_wrap)
            .field("double_star_wrap", &self.double_star_wrap)
            .finish()
    }
}

/// Descriptor of a one-argument element mapping.
#[derive(Clone)]
pub struct MapDef {
    pub name: String,
    pub func: MapFn,
    /// Spread the element's items as leading positional arguments.
    pub star_wrap: bool,
    /// Spread a mapping element as keyword arguments.
    pub double_star_wrap: bool,
    pub no_over_write: bool,
}

impl MapDef {
    pub fn new(name: impl Into<String>, f: impl Fn(&CallArgs) -> Result<Value> + 'static) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(f),
            star_wrap: false,
            double_star_wrap: false,
            no_over_write: true,
        }
    }

    /// Mapping that ignores extra call arguments.
    pub fn unary(name: impl Into<String>, f: impl Fn(&Value) -> Result<Value> + 'static) -> Self {
        Self::new(name, move |args| f(&args.value_at(0)?))
    }

    pub fn star_wrap(mut self) -> Self {
        self.star_wrap = true;
        self
    }

    pub fn double_star_wrap(mut self) -> Self {
        self.double_star_wrap = true;
        self
    }

    pub fn allow_overwrite(mut self) -> Self {
        self.no_over_write = false;
        self
    }
}

impl fmt::Debug for MapDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapDef")
            .field("name", &self.name)
            .field("star_wrap", &self.star_wrap)
            .field("double_star_wrap", &self.double_star_wrap)
            .finish()
    }
}

/// A named, loadable set of stage descriptors.
#[derive(Debug, Clone)]
pub struct AddIn {
    pub name: String,
    pub stages: Vec<StageDef>,
    pub maps: Vec<MapDef>,
}

impl AddIn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            maps: Vec::new(),
        }
    }

    pub fn stage(mut self, def: StageDef) -> Self {
        self.stages.push(def);
        self
    }

    pub fn map(mut self, def: MapDef) -> Self {
        self.maps.push(def);
        self
    }

    /// Names this add-in registers, stages first.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.stages
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.maps.iter().map(|m| m.name.as_str()))
    }
}
