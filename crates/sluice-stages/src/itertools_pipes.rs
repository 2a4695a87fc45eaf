//! Stages modelled on the standard iterator toolkit.
//!
//! Stateful stages keep their state for one batch and start over when the
//! source is refilled.

use std::collections::VecDeque;

use sluice_core::{
    from_fn, AddIn, CallArgs, FlowRef, Func, PipeError, Pull, Result, StageDef, Value,
};

use crate::support::{int_arg, per_batch, stop};

pub const NAME: &str = "itertools_pipes";

pub fn add_in() -> AddIn {
    AddIn::new(NAME)
        .stage(groupby())
        .stage(groupby_key())
        .stage(islice())
        .stage(takewhile())
        .stage(dropwhile())
        .stage(accumulate())
        .stage(chain())
        .stage(starmap())
        .stage(pairwise())
}

/// A callable given at `index` or as keyword `name`.
fn func_arg(args: &CallArgs, index: usize, name: &str) -> Result<Option<Func>> {
    match args.func_opt(index)? {
        Some(f) => Ok(Some(f)),
        None => args.kw_func_opt(name),
    }
}

#[derive(Default)]
struct Grouping {
    current: Option<(Value, Vec<Value>)>,
    finished: bool,
}

fn group_flow(upstream: FlowRef, key: impl Fn(&Value) -> Result<Value> + 'static) -> FlowRef {
    per_batch(upstream, || Ok(Grouping::default()), move |up, state| {
        if state.finished {
            return Ok(Pull::Done);
        }
        loop {
            match up.pull()? {
                Pull::Item(v) => {
                    let k = key(&v)?;
                    match state.current.as_mut() {
                        Some((current, group)) if *current == k => group.push(v),
                        _ => {
                            if let Some((done_key, group)) = state.current.replace((k, vec![v])) {
                                return Ok(Pull::Item(Value::Tuple(vec![
                                    done_key,
                                    Value::List(group),
                                ])));
                            }
                        }
                    }
                }
                Pull::Dry => return Ok(Pull::Dry),
                Pull::Done => {
                    state.finished = true;
                    return Ok(match state.current.take() {
                        Some((k, group)) => Pull::Item(Value::Tuple(vec![k, Value::List(group)])),
                        None => Pull::Done,
                    });
                }
            }
        }
    })
}

/// `groupby(key=None)`: runs of consecutive elements with equal keys, as
/// `(key, [elements])`.
pub fn groupby() -> StageDef {
    StageDef::through("groupby", |args: CallArgs| {
        let key = func_arg(&args, 1, "key")?;
        Ok(group_flow(args.flow(0)?, move |v| match &key {
            Some(f) => f.call1(v),
            None => Ok(v.clone()),
        }))
    })
    .star_wrap("key")
}

/// `groupby_key()`: groups `(key, value)` pairs by their key.
pub fn groupby_key() -> StageDef {
    StageDef::through("groupby_key", |args: CallArgs| {
        Ok(group_flow(args.flow(0)?, |v| v.index(&Value::Int(0))))
    })
}

fn slice_bound(v: Option<Value>) -> Result<Option<i64>> {
    match v {
        None | Some(Value::None) => Ok(None),
        Some(v) => match int_arg(&v, "islice() index")? {
            i if i >= 0 => Ok(Some(i)),
            _ => Err(PipeError::Value(
                "Indices for islice() must be None or an integer: 0 <= x <= sys.maxsize."
                    .to_string(),
            )),
        },
    }
}

/// `islice(stop)` or `islice(start, stop, step=1)`. Drains the rest of the
/// batch once `stop` is reached.
pub fn islice() -> StageDef {
    StageDef::through("islice", |args: CallArgs| {
        let bounds = args.values_from(1)?;
        let (start, stop_at, step) = match bounds.as_slice() {
            [stop_at] => (None, slice_bound(Some(stop_at.clone()))?, None),
            [start, stop_at] => (
                slice_bound(Some(start.clone()))?,
                slice_bound(Some(stop_at.clone()))?,
                None,
            ),
            [start, stop_at, step] => (
                slice_bound(Some(start.clone()))?,
                slice_bound(Some(stop_at.clone()))?,
                slice_bound(Some(step.clone()))?,
            ),
            _ => {
                return Err(PipeError::Type(format!(
                    "islice expected 1 to 3 bounds, got {}",
                    bounds.len()
                )))
            }
        };
        let start = start.unwrap_or(0);
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(PipeError::Value(
                "Step for islice() must be a positive integer or None.".to_string(),
            ));
        }
        Ok(per_batch(
            args.flow(0)?,
            move || Ok((0i64, start)),
            move |up, (position, next)| loop {
                if stop_at.is_some_and(|s| *next >= s) {
                    return stop(up);
                }
                match up.pull()? {
                    Pull::Item(v) => {
                        let at = *position;
                        *position += 1;
                        if at == *next {
                            *next += step;
                            return Ok(Pull::Item(v));
                        }
                    }
                    other => return Ok(other),
                }
            },
        ))
    })
}

/// `takewhile(predicate)`: passes elements until the predicate first
/// fails, then drains the rest of the batch.
pub fn takewhile() -> StageDef {
    StageDef::through("takewhile", |args: CallArgs| {
        let predicate = args.func_at(0)?;
        let upstream = args.flow(1)?;
        Ok(from_fn(move || match upstream.pull()? {
            Pull::Item(v) if predicate.test(&v)? => Ok(Pull::Item(v)),
            Pull::Item(_) => stop(&upstream),
            other => Ok(other),
        }))
    })
    .iter_index(1)
    .star_wrap(0)
}

/// `dropwhile(predicate)`: skips elements while the predicate holds.
pub fn dropwhile() -> StageDef {
    StageDef::through("dropwhile", |args: CallArgs| {
        let predicate = args.func_at(0)?;
        Ok(per_batch(
            args.flow(1)?,
            || Ok(true),
            move |up, dropping| loop {
                match up.pull()? {
                    Pull::Item(v) => {
                        if *dropping && predicate.test(&v)? {
                            continue;
                        }
                        *dropping = false;
                        return Ok(Pull::Item(v));
                    }
                    other => return Ok(other),
                }
            },
        ))
    })
    .iter_index(1)
    .star_wrap(0)
}

/// `accumulate(func=add, initial=None)`: running totals.
pub fn accumulate() -> StageDef {
    StageDef::through("accumulate", |args: CallArgs| {
        let func = func_arg(&args, 1, "func")?;
        let initial = args.kw_value_opt("initial")?.filter(|v| !v.is_none());
        Ok(per_batch(
            args.flow(0)?,
            || Ok((None::<Value>, false)),
            move |up, (total, started)| {
                if !*started {
                    *started = true;
                    if let Some(init) = &initial {
                        *total = Some(init.clone());
                        return Ok(Pull::Item(init.clone()));
                    }
                }
                match up.pull()? {
                    Pull::Item(v) => {
                        let next = match total.take() {
                            None => v,
                            Some(t) => match &func {
                                Some(f) => f.call(&[t, v])?,
                                None => t.add(&v)?,
                            },
                        };
                        *total = Some(next.clone());
                        Ok(Pull::Item(next))
                    }
                    other => Ok(other),
                }
            },
        ))
    })
}

/// `chain(*iterables)`: the batch, then the items of every argument.
pub fn chain() -> StageDef {
    StageDef::through("chain", |args: CallArgs| {
        let tail = args
            .values_from(1)?
            .into_iter()
            .map(Value::into_items)
            .collect::<Result<Vec<_>>>()?
            .concat();
        Ok(per_batch(
            args.flow(0)?,
            move || Ok((false, tail.iter().cloned().collect::<VecDeque<_>>())),
            |up, (upstream_done, rest)| {
                if !*upstream_done {
                    match up.pull()? {
                        Pull::Done => *upstream_done = true,
                        other => return Ok(other),
                    }
                }
                Ok(rest.pop_front().map_or(Pull::Done, Pull::Item))
            },
        ))
    })
}

/// `starmap(func)`: calls `func` with the items of every element.
pub fn starmap() -> StageDef {
    StageDef::through("starmap", |args: CallArgs| {
        let func = args.func_at(0)?;
        let upstream = args.flow(1)?;
        Ok(from_fn(move || match upstream.pull()? {
            Pull::Item(v) => Ok(Pull::Item(func.call(&v.into_items()?)?)),
            other => Ok(other),
        }))
    })
    .iter_index(1)
}

/// `pairwise()`: overlapping pairs of consecutive elements.
pub fn pairwise() -> StageDef {
    StageDef::through("pairwise", |args: CallArgs| {
        Ok(per_batch(
            args.flow(0)?,
            || Ok(None::<Value>),
            |up, previous| loop {
                match up.pull()? {
                    Pull::Item(v) => {
                        if let Some(prev) = previous.replace(v.clone()) {
                            return Ok(Pull::Item(Value::Tuple(vec![prev, v])));
                        }
                    }
                    other => return Ok(other),
                }
            },
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{run_through, run_through_with, try_through};
    use sluice_core::ErrorKind;
    use sluice_test::ints;

    fn group(key: impl Into<Value>, items: &[i64]) -> Value {
        Value::Tuple(vec![key.into(), Value::List(ints(items))])
    }

    #[test]
    fn test_groupby_consecutive_runs() {
        let out = run_through(groupby(), ints(&[1, 1, 2, 1]));
        assert_eq!(out, vec![group(1, &[1, 1]), group(2, &[2]), group(1, &[1])]);
    }

    #[test]
    fn test_groupby_with_key() {
        let parity = Func::unary("parity", |v| v.rem(&Value::Int(2)));
        let out = run_through_with(groupby(), CallArgs::new().kw_func("key", parity), ints(&[1, 3, 2]));
        assert_eq!(out, vec![group(1, &[1, 3]), group(0, &[2])]);
    }

    #[test]
    fn test_groupby_key() {
        let data = vec![Value::from(("a", 1)), Value::from(("a", 2)), Value::from(("b", 3))];
        let out = run_through(groupby_key(), data);
        assert_eq!(
            out,
            vec![
                Value::Tuple(vec![
                    Value::str("a"),
                    Value::list([Value::from(("a", 1)), Value::from(("a", 2))]),
                ]),
                Value::Tuple(vec![Value::str("b"), Value::list([Value::from(("b", 3))])]),
            ]
        );
    }

    #[test]
    fn test_groupby_empty() {
        assert!(run_through(groupby(), vec![]).is_empty());
    }

    #[test]
    fn test_islice() {
        let data = ints(&[0, 1, 2, 3, 4, 5, 6]);
        let out = run_through_with(islice(), CallArgs::new().value(3), data.clone());
        assert_eq!(out, ints(&[0, 1, 2]));
        let call = CallArgs::new().value(1).value(6).value(2);
        assert_eq!(run_through_with(islice(), call, data.clone()), ints(&[1, 3, 5]));
        let call = CallArgs::new().value(4).value(Value::None);
        assert_eq!(run_through_with(islice(), call, data), ints(&[4, 5, 6]));
    }

    #[test]
    fn test_islice_rejects_negative() {
        let err = try_through(islice(), CallArgs::new().value(-1), ints(&[1])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_takewhile_and_dropwhile() {
        let small = Func::predicate("small", |v| v.as_int().is_some_and(|i| i < 3));
        let data = ints(&[1, 2, 5, 1]);
        let call = CallArgs::new().func(small.clone());
        assert_eq!(run_through_with(takewhile(), call, data.clone()), ints(&[1, 2]));
        let call = CallArgs::new().func(small);
        assert_eq!(run_through_with(dropwhile(), call, data), ints(&[5, 1]));
    }

    #[test]
    fn test_accumulate() {
        assert_eq!(run_through(accumulate(), ints(&[1, 2, 3])), ints(&[1, 3, 6]));
        let mul = Func::binary("mul", |a, b| a.mul(b));
        let call = CallArgs::new().func(mul).kw_value("initial", 2);
        assert_eq!(run_through_with(accumulate(), call, ints(&[3, 4])), ints(&[2, 6, 24]));
    }

    #[test]
    fn test_chain() {
        let call = CallArgs::new().value(Value::tuple([3])).value(Value::list([4, 5]));
        assert_eq!(run_through_with(chain(), call, ints(&[1, 2])), ints(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_starmap_and_pairwise() {
        let add = Func::binary("add", |a, b| a.add(b));
        let data = vec![Value::from((1, 2)), Value::from((3, 4))];
        assert_eq!(run_through_with(starmap(), CallArgs::new().func(add), data), ints(&[3, 7]));
        assert_eq!(
            run_through(pairwise(), ints(&[1, 2, 3])),
            vec![Value::from((1, 2)), Value::from((2, 3))]
        );
    }
}
