//! Stages modelled on the usual builtin functions.
//!
//! Collections and reductions are terminal stages; `enumerate`, `filter`
//! and `zip` are through stages. Element-wise conversions are map stages,
//! the ones shadowing a terminal carry an `_e` suffix.

mod convert;

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use sluice_core::{
    from_fn, AddIn, CallArgs, ErrorKind, Func, PipeError, Pull, Result, StageDef, Value,
};

use crate::support::{collect, int_arg, per_batch, stop, value_arg};

pub const NAME: &str = "built_in_functions";

pub fn add_in() -> AddIn {
    let add_in = AddIn::new(NAME)
        .stage(collection("dict", convert::to_dict))
        .stage(collection("frozenset", |items| Ok(Value::set(items))))
        .stage(collection("set", |items| Ok(Value::set(items))))
        .stage(collection("list", |items| Ok(Value::List(items))))
        .stage(collection("tuple", |items| Ok(Value::Tuple(items))))
        .stage(all())
        .stage(any())
        .stage(max().star_wrap("key"))
        .stage(min().star_wrap("key"))
        .stage(max().named("max_kargs").double_star_wrap("key"))
        .stage(min().named("min_kargs").double_star_wrap("key"))
        .stage(sum())
        .stage(sorted().star_wrap("key"))
        .stage(sorted().named("sorted_kargs").double_star_wrap("key"))
        .stage(enumerate())
        .stage(filter().star_wrap(0))
        .stage(filter().named("filter_kargs").double_star_wrap(0))
        .stage(zip());
    convert::maps().into_iter().fold(add_in, AddIn::map)
}

/// A terminal stage gathering the whole input into one collection.
fn collection(name: &str, build: fn(Vec<Value>) -> Result<Value>) -> StageDef {
    StageDef::terminal(name, move |args: &CallArgs| build(collect(args)?))
}

pub fn all() -> StageDef {
    StageDef::terminal("all", |args: &CallArgs| {
        let upstream = args.flow(0)?;
        for v in upstream.items() {
            if !v?.truthy() {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    })
}

pub fn any() -> StageDef {
    StageDef::terminal("any", |args: &CallArgs| {
        let upstream = args.flow(0)?;
        for v in upstream.items() {
            if v?.truthy() {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    })
}

/// Returns the first element whose key compares as `want` against every
/// later one.
pub(crate) fn extreme(
    items: impl IntoIterator<Item = Result<Value>>,
    key: Option<&Func>,
    want: Ordering,
) -> Result<Option<Value>> {
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let item = item?;
        let k = match key {
            Some(f) => f.call1(&item)?,
            None => item.clone(),
        };
        match &best {
            Some((best_key, _)) if k.cmp(best_key) != want => {}
            _ => best = Some((k, item)),
        }
    }
    Ok(best.map(|(_, item)| item))
}

fn extreme_stage(name: &'static str, want: Ordering) -> StageDef {
    StageDef::terminal(name, move |args: &CallArgs| {
        let key = args.kw_func_opt("key")?;
        let upstream = args.flow(0)?;
        match extreme(upstream.items(), key.as_ref(), want)? {
            Some(v) => Ok(v),
            None => args
                .kw_value_opt("default")?
                .ok_or_else(|| PipeError::Value(format!("{name}() arg is an empty sequence"))),
        }
    })
    .empty_error(ErrorKind::Value)
}

/// `max(key=None, default=...)`: the first largest element.
pub fn max() -> StageDef {
    extreme_stage("max", Ordering::Greater)
}

/// `min(key=None, default=...)`: the first smallest element.
pub fn min() -> StageDef {
    extreme_stage("min", Ordering::Less)
}

pub(crate) fn sum_values(
    items: impl IntoIterator<Item = Result<Value>>,
    start: Value,
) -> Result<Value> {
    if start.as_str().is_some() {
        return Err(PipeError::Type(
            "sum() can't sum strings [use ''.join(seq) instead]".to_string(),
        ));
    }
    items.into_iter().try_fold(start, |total, v| total.add(&v?))
}

/// `sum(start=0)`.
pub fn sum() -> StageDef {
    StageDef::terminal("sum", |args: &CallArgs| {
        let start = value_arg(args, 1, "start")?.unwrap_or(Value::Int(0));
        sum_values(args.flow(0)?.items(), start)
    })
}

/// Stable sort by an optional key. Reversing keeps equal elements in input
/// order.
pub(crate) fn sort_values(
    items: Vec<Value>,
    key: Option<&Func>,
    reverse: bool,
) -> Result<Vec<Value>> {
    let mut keyed = items
        .into_iter()
        .map(|v| {
            let k = match key {
                Some(f) => f.call1(&v)?,
                None => v.clone(),
            };
            Ok((k, v))
        })
        .collect::<Result<Vec<_>>>()?;
    if reverse {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    }
    Ok(keyed.into_iter().map(|(_, v)| v).collect())
}

/// `sorted(key=None, reverse=False)`: a list of every element.
pub fn sorted() -> StageDef {
    StageDef::terminal("sorted", |args: &CallArgs| {
        let key = args.kw_func_opt("key")?;
        let reverse = args
            .kw_value_opt("reverse")?
            .map(|v| v.truthy())
            .unwrap_or(false);
        Ok(Value::List(sort_values(collect(args)?, key.as_ref(), reverse)?))
    })
}

/// `enumerate(start=0)`: pairs every element with its position in the batch.
pub fn enumerate() -> StageDef {
    StageDef::through("enumerate", |args: CallArgs| {
        let start = match value_arg(&args, 1, "start")? {
            Some(v) => int_arg(&v, "enumerate() start")?,
            None => 0,
        };
        Ok(per_batch(
            args.flow(0)?,
            move || Ok(start),
            |up, count| match up.pull()? {
                Pull::Item(v) => {
                    let pair = Value::Tuple(vec![Value::Int(*count), v]);
                    *count += 1;
                    Ok(Pull::Item(pair))
                }
                other => Ok(other),
            },
        ))
    })
}

/// `filter(predicate)`: keeps elements the predicate accepts. A `None`
/// predicate keeps truthy elements.
pub fn filter() -> StageDef {
    StageDef::through("filter", |args: CallArgs| {
        let predicate = args.func_opt(0)?;
        let upstream = args.flow(1)?;
        Ok(from_fn(move || loop {
            match upstream.pull()? {
                Pull::Item(v) => {
                    let keep = match &predicate {
                        Some(p) => p.test(&v)?,
                        None => v.truthy(),
                    };
                    if keep {
                        return Ok(Pull::Item(v));
                    }
                }
                other => return Ok(other),
            }
        }))
    })
    .iter_index(1)
}

/// `zip(*others)`: tuples of each element with the matching items of every
/// other iterable. Stops with the shortest.
pub fn zip() -> StageDef {
    StageDef::through("zip", |args: CallArgs| {
        let others = args
            .values_from(1)?
            .into_iter()
            .map(Value::into_items)
            .collect::<Result<Vec<_>>>()?;
        Ok(per_batch(
            args.flow(0)?,
            move || Ok(others.iter().map(|o| o.clone().into_iter()).collect::<Vec<_>>()),
            |up, cursors| {
                if cursors.iter().any(|c| c.as_slice().is_empty()) {
                    return stop(up);
                }
                match up.pull()? {
                    Pull::Item(v) => {
                        let mut row = vec![v];
                        row.extend(cursors.iter_mut().filter_map(Iterator::next));
                        Ok(Pull::Item(Value::Tuple(row)))
                    }
                    other => Ok(other),
                }
            },
        ))
    })
}
