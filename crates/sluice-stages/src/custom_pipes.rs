//! Stages with no library counterpart.

use std::collections::{BTreeMap, VecDeque};

use sluice_core::{AddIn, CallArgs, FlowRef, PipeError, Pull, Result, StageDef, Value};

use crate::support::per_batch;

pub const NAME: &str = "custom_pipes";

pub fn add_in() -> AddIn {
    AddIn::new(NAME).stage(zip_internal()).stage(zip_to_dict())
}

/// Gathers the whole batch, then yields what `emit` makes of it.
fn gathered(upstream: FlowRef, emit: fn(Vec<Value>) -> Result<Vec<Value>>) -> FlowRef {
    per_batch(
        upstream,
        || Ok((Vec::new(), None::<VecDeque<Value>>)),
        move |up, (rows, out)| {
            if out.is_none() {
                loop {
                    match up.pull()? {
                        Pull::Item(v) => rows.push(v),
                        Pull::Dry => return Ok(Pull::Dry),
                        Pull::Done => break,
                    }
                }
                *out = Some(emit(std::mem::take(rows))?.into());
            }
            Ok(out
                .as_mut()
                .and_then(VecDeque::pop_front)
                .map_or(Pull::Done, Pull::Item))
        },
    )
}

fn shortest(columns: &[Vec<Value>]) -> usize {
    columns.iter().map(Vec::len).min().unwrap_or(0)
}

/// `zip_internal()`: zips the elements of the batch with each other.
///
/// `((1, 2, 3), (4, 5, 6))` becomes `(1, 4), (2, 5), (3, 6)`.
pub fn zip_internal() -> StageDef {
    StageDef::through("zip_internal", |args: CallArgs| {
        Ok(gathered(args.flow(0)?, |rows| {
            let columns = rows
                .into_iter()
                .map(Value::into_items)
                .collect::<Result<Vec<_>>>()?;
            Ok((0..shortest(&columns))
                .map(|i| Value::Tuple(columns.iter().map(|c| c[i].clone()).collect()))
                .collect())
        }))
    })
}

/// `zip_to_dict()`: turns `(key, values)` pairs into one mapping per
/// position, stopping with the shortest `values`.
///
/// `("a", (1, 2)), ("b", (3, 4))` becomes `{"a": 1, "b": 3}, {"a": 2, "b": 4}`.
pub fn zip_to_dict() -> StageDef {
    StageDef::through("zip_to_dict", |args: CallArgs| {
        Ok(gathered(args.flow(0)?, |rows| {
            let mut keys = Vec::with_capacity(rows.len());
            let mut columns = Vec::with_capacity(rows.len());
            for row in rows {
                let [key, values]: [Value; 2] = row.into_items()?.try_into().map_err(|_| {
                    PipeError::Value("zip_to_dict() expects (key, values) pairs".to_string())
                })?;
                keys.push(key);
                columns.push(values.into_items()?);
            }
            Ok((0..shortest(&columns))
                .map(|i| {
                    let entries: BTreeMap<Value, Value> = keys
                        .iter()
                        .zip(&columns)
                        .map(|(k, c)| (k.clone(), c[i].clone()))
                        .collect();
                    Value::Dict(entries)
                })
                .collect())
        }))
    })
}
