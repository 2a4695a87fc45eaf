//! Drivers for exercising stage definitions without a registry.
//!
//! Arguments are passed through as given: callables must already be in the
//! shape the stage expects.

use sluice_core::{
    Arg, CallArgs, FlowRef, IterFlow, MapDef, Result, StageDef, StageKind, Value,
};

fn splice(def: &StageDef, mut call: CallArgs, data: Vec<Value>) -> CallArgs {
    let upstream = FlowRef::new(IterFlow::values(data));
    call.insert(def.iter_index, Arg::Flow(upstream));
    call
}

/// Builds the through stage over a caller-held upstream.
pub(crate) fn build_over(def: StageDef, mut call: CallArgs, upstream: FlowRef) -> Result<FlowRef> {
    call.insert(def.iter_index, Arg::Flow(upstream));
    match def.kind {
        StageKind::Through(build) => build(call),
        StageKind::Terminal(_) => panic!("{} is a terminal stage", def.name),
    }
}

/// Builds the through stage over `data`.
pub(crate) fn build_through(def: StageDef, call: CallArgs, data: Vec<Value>) -> Result<FlowRef> {
    build_over(def, call, FlowRef::new(IterFlow::values(data)))
}

pub(crate) fn try_through(def: StageDef, call: CallArgs, data: Vec<Value>) -> Result<Vec<Value>> {
    build_through(def, call, data)?.collect_items()
}

pub(crate) fn run_through_with(def: StageDef, call: CallArgs, data: Vec<Value>) -> Vec<Value> {
    try_through(def, call, data).unwrap()
}

pub(crate) fn run_through(def: StageDef, data: Vec<Value>) -> Vec<Value> {
    run_through_with(def, CallArgs::new(), data)
}

pub(crate) fn run_terminal(def: StageDef, call: CallArgs, data: Vec<Value>) -> Result<Value> {
    let call = splice(&def, call, data);
    match def.kind {
        StageKind::Terminal(func) => func(&call),
        StageKind::Through(_) => panic!("{} is a through stage", def.name),
    }
}

/// Applies a map stage to one element with extra arguments.
pub(crate) fn apply_map(def: &MapDef, element: Value, extras: CallArgs) -> Result<Value> {
    let mut call = extras;
    call.insert(0, Arg::Value(element));
    (def.func)(&call)
}

/// Finds a map stage of an add-in by name.
pub(crate) fn map_def(add_in: &sluice_core::AddIn, name: &str) -> MapDef {
    add_in
        .maps
        .iter()
        .find(|m| m.name == name)
        .cloned()
        .unwrap_or_else(|| panic!("no map stage {name}"))
}
