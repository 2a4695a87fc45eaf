//! Debugging aids for pipelines under test.

use sluice_core::{AddIn, CallArgs, MapDef, PipeError, Pull, StageDef, Value};

use crate::support::{int_arg, per_batch, value_arg};

pub const NAME: &str = "testing_tools";

pub fn add_in() -> AddIn {
    AddIn::new(NAME).stage(limit_size()).map(look_in())
}

/// `limit_size(max_size, label="")`: fails with a value error once more
/// than `max_size` elements pass in one batch.
pub fn limit_size() -> StageDef {
    StageDef::through("limit_size", |args: CallArgs| {
        let max_size = match value_arg(&args, 1, "max_size")? {
            Some(v) => int_arg(&v, "limit_size() max_size")?,
            None => {
                return Err(PipeError::Type(
                    "limit_size() missing required argument: 'max_size'".to_string(),
                ))
            }
        };
        let label = value_arg(&args, 2, "label")?
            .map(|v| v.to_string())
            .unwrap_or_default();
        Ok(per_batch(
            args.flow(0)?,
            || Ok(0i64),
            move |up, passed| match up.pull()? {
                Pull::Item(_) if *passed >= max_size => Err(PipeError::Value(format!(
                    "More objects passed through limit_size {label} than {max_size}"
                ))),
                Pull::Item(v) => {
                    *passed += 1;
                    Ok(Pull::Item(v))
                }
                other => Ok(other),
            },
        ))
    })
}

/// `look_in(observer)`: shows every element to `observer` and passes it on.
pub fn look_in() -> MapDef {
    MapDef::new("look_in", |args: &CallArgs| {
        let element = args.value_at(0)?;
        args.func_at(1)?.call1(&element)?;
        Ok(element)
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::testing::{apply_map, run_through_with, try_through};
    use sluice_core::{ErrorKind, Func};
    use sluice_test::ints;

    #[test]
    fn test_limit_size_passes_small_batches() {
        let call = CallArgs::new().value(3);
        assert_eq!(run_through_with(limit_size(), call, ints(&[1, 2, 3])), ints(&[1, 2, 3]));
    }

    #[test]
    fn test_limit_size_message() {
        let call = CallArgs::new().value(1).value("a");
        let err = try_through(limit_size(), call, ints(&[1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(err.to_string(), "More objects passed through limit_size a than 1");
    }

    #[test]
    fn test_look_in_records_elements() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let observer = Func::unary("observe", move |v| {
            sink.borrow_mut().push(v.clone());
            Ok(Value::None)
        });
        let out = apply_map(&look_in(), Value::Int(4), CallArgs::new().func(observer)).unwrap();
        assert_eq!(out, Value::Int(4));
        assert_eq!(*seen.borrow(), ints(&[4]));
    }
}
