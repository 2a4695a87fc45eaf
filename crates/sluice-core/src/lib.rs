//! Sluice Core - values, callables and stage contracts
//!
//! This crate provides the building blocks shared by the pipeline engine
//! and the stage catalogs:
//! - `Value`, the dynamic element type flowing through pipelines
//! - `Func`, caller supplied callables with declared parameters
//! - the pull protocol (`Flow`, `FlowRef`, `Pull`)
//! - stage descriptors (`StageDef`, `MapDef`, `AddIn`)

pub mod args;
pub mod error;
pub mod flow;
pub mod func;
pub mod stage;
pub mod value;


pub use args::{Arg, CallArgs};
pub use error::{ErrorKind, PipeError, Result};
pub use flow::{from_fn, Build, Flow, FlowRef, FnFlow, Items, IterFlow, Pull, Regenerate};
pub use func::{Func, Params};
pub use stage::{
    AddIn, MapDef, MapFn, OverwritePolicy, Spread, StageDef, StageKind, TerminalFn, ThroughFn,
    WrapTarget,
};
pub use value::Value;
