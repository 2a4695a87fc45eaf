//! Flow helpers shared by the catalogs.

use std::rc::Rc;

use sluice_core::{
    from_fn, CallArgs, Flow, FlowRef, FnFlow, PipeError, Pull, Regenerate, Result, Value,
};

/// Lazily maps every element of `upstream`.
pub(crate) fn map_flow(
    upstream: FlowRef,
    mut f: impl FnMut(Value) -> Result<Value> + 'static,
) -> FlowRef {
    from_fn(move || match upstream.pull()? {
        Pull::Item(v) => Ok(Pull::Item(f(v)?)),
        other => Ok(other),
    })
}

/// Builds a flow whose state lives for one batch.
///
/// `step` receives the upstream and a fresh state each batch; the state is
/// discarded once `step` reports [`Pull::Done`].
pub(crate) fn per_batch<S, I, F>(upstream: FlowRef, init: I, step: F) -> FlowRef
where
    S: 'static,
    I: Fn() -> Result<S> + 'static,
    F: Fn(&FlowRef, &mut S) -> Result<Pull> + 'static,
{
    let step = Rc::new(step);
    let build = move |up: FlowRef| -> Result<Box<dyn Flow>> {
        let mut state = init()?;
        let step = step.clone();
        Ok(Box::new(FnFlow::new(move || step(&up, &mut state))))
    };
    FlowRef::new(Regenerate::new(upstream, Rc::new(build)))
}

/// Ends a batch early: discards the rest of it so the source can be
/// refilled.
pub(crate) fn stop(upstream: &FlowRef) -> Result<Pull> {
    upstream.drain()?;
    Ok(Pull::Done)
}

/// The upstream flow of a terminal stage, collected.
pub(crate) fn collect(args: &CallArgs) -> Result<Vec<Value>> {
    args.flow(0)?.collect_items()
}

/// An optional argument given either at `index` or as keyword `name`.
pub(crate) fn value_arg(args: &CallArgs, index: usize, name: &str) -> Result<Option<Value>> {
    match args.opt_value(index)? {
        Some(v) => Ok(Some(v)),
        None => args.kw_value_opt(name),
    }
}

pub(crate) fn int_arg(value: &Value, what: &str) -> Result<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(PipeError::Type(format!(
            "{what} must be an integer, not {}",
            other.type_name()
        ))),
    }
}
