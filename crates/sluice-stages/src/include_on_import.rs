//! Stages every registry built by the facade starts with.

use std::collections::VecDeque;

use sluice_core::{from_fn, AddIn, CallArgs, MapDef, Pull, StageDef, Value};

use crate::support::map_flow;

pub const NAME: &str = "include_on_import";

pub fn add_in() -> AddIn {
    AddIn::new(NAME)
        .stage(map())
        .stage(map_kargs())
        .stage(flatten())
        .stage(grab())
        .map(MapDef::unary("drop_key", |pair| pair.index(&Value::Int(1))))
}

fn apply_each(name: &str) -> StageDef {
    StageDef::through(name, |args: CallArgs| {
        let func = args.func_at(0)?;
        Ok(map_flow(args.flow(1)?, move |v| func.call1(&v)))
    })
    .iter_index(1)
}

/// `map(func)`: applies `func` to every element. Elements are spread over
/// the parameters of a multi-parameter `func`.
pub fn map() -> StageDef {
    apply_each("map").star_wrap(0)
}

/// `map_kargs(func)`: like `map`, but mapping elements are matched to the
/// parameter names of `func`.
pub fn map_kargs() -> StageDef {
    apply_each("map_kargs").double_star_wrap(0)
}

/// `flatten()`: yields the items of every element, one at a time.
pub fn flatten() -> StageDef {
    StageDef::through("flatten", |args: CallArgs| {
        let upstream = args.flow(0)?;
        let mut queue = VecDeque::new();
        Ok(from_fn(move || loop {
            if let Some(v) = queue.pop_front() {
                return Ok(Pull::Item(v));
            }
            match upstream.pull()? {
                Pull::Item(element) => queue.extend(element.into_items()?),
                other => return Ok(other),
            }
        }))
    })
}

/// `grab(key)`: subscripts every element with `key`.
pub fn grab() -> StageDef {
    StageDef::through("grab", |args: CallArgs| {
        let key = args.value_at(0)?;
        Ok(map_flow(args.flow(1)?, move |v| v.index(&key)))
    })
    .iter_index(1)
}
