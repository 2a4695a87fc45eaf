//! Minimal stage definitions.
//!
//! These mirror the shapes of the real catalog stages (upstream position,
//! spread directives, empty-input classification) without their breadth.

use std::collections::VecDeque;

use sluice_core::{
    from_fn, AddIn, CallArgs, ErrorKind, MapDef, PipeError, Pull, Result, StageDef, Value,
};

/// Fixture add-in holding every stage in this module.
pub fn add_in() -> AddIn {
    AddIn::new("fixtures")
        .stage(map())
        .stage(filter())
        .stage(expand())
        .stage(tuple())
        .stage(list())
        .stage(max())
        .stage(min())
        .stage(sorted())
        .map(pass_through())
}

/// `map(func)`: applies `func` to every element.
pub fn map() -> StageDef {
    StageDef::through("map", |args: CallArgs| {
        let func = args.func_at(0)?;
        let upstream = args.flow(1)?;
        Ok(from_fn(move || match upstream.pull()? {
            Pull::Item(v) => Ok(Pull::Item(func.call1(&v)?)),
            other => Ok(other),
        }))
    })
    .iter_index(1)
    .star_wrap(0)
}

/// `filter(predicate)`: keeps elements the predicate accepts.
pub fn filter() -> StageDef {
    StageDef::through("filter", |args: CallArgs| {
        let predicate = args.func_at(0)?;
        let upstream = args.flow(1)?;
        Ok(from_fn(move || loop {
            match upstream.pull()? {
                Pull::Item(v) => {
                    if predicate.test(&v)? {
                        return Ok(Pull::Item(v));
                    }
                }
                other => return Ok(other),
            }
        }))
    })
    .iter_index(1)
    .star_wrap(0)
}

/// `Expand`: yields `0` then `1` for every element.
pub fn expand() -> StageDef {
    StageDef::through("Expand", |args: CallArgs| {
        let upstream = args.flow(0)?;
        let mut queue: VecDeque<Value> = VecDeque::new();
        Ok(from_fn(move || {
            if let Some(v) = queue.pop_front() {
                return Ok(Pull::Item(v));
            }
            match upstream.pull()? {
                Pull::Item(_) => {
                    queue.push_back(Value::Int(1));
                    Ok(Pull::Item(Value::Int(0)))
                }
                other => Ok(other),
            }
        }))
    })
}

pub fn tuple() -> StageDef {
    StageDef::terminal("tuple", |args: &CallArgs| {
        Ok(Value::Tuple(args.flow(0)?.collect_items()?))
    })
}

pub fn list() -> StageDef {
    StageDef::terminal("list", |args: &CallArgs| {
        Ok(Value::List(args.flow(0)?.collect_items()?))
    })
}

pub fn max() -> StageDef {
    StageDef::terminal("max", |args: &CallArgs| {
        args.flow(0)?
            .collect_items()?
            .into_iter()
            .max()
            .ok_or_else(|| PipeError::Value("max() arg is an empty sequence".to_string()))
    })
    .empty_error(ErrorKind::Value)
}

pub fn min() -> StageDef {
    StageDef::terminal("min", |args: &CallArgs| {
        args.flow(0)?
            .collect_items()?
            .into_iter()
            .min()
            .ok_or_else(|| PipeError::Value("min() arg is an empty sequence".to_string()))
    })
    .empty_error(ErrorKind::Value)
}

pub fn sorted() -> StageDef {
    StageDef::terminal("sorted", |args: &CallArgs| -> Result<Value> {
        let mut items = args.flow(0)?.collect_items()?;
        items.sort();
        Ok(Value::List(items))
    })
}

/// Map stage returning each element unchanged.
pub fn pass_through() -> MapDef {
    MapDef::unary("pass_through", |v| Ok(v.clone()))
}
