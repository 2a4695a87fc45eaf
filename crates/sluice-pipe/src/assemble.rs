//! Argument assembly for stage invocations.

use sluice_core::{Arg, CallArgs, FlowRef, Func, PipeError, Result, Spread, StageDef, WrapTarget};

/// Applies the stage's spread directive to the caller's arguments, then
/// splices the upstream flow in at the stage's upstream position.
pub(crate) fn assemble(def: &StageDef, mut call: CallArgs, upstream: FlowRef) -> Result<CallArgs> {
    match def.spread()? {
        Some(Spread::Star(target)) => wrap(def, &mut call, &target, |f| Ok(f.star()))?,
        Some(Spread::DoubleStar(target)) => wrap(def, &mut call, &target, Func::double_star)?,
        None => {}
    }
    call.insert(def.iter_index, Arg::Flow(upstream));
    Ok(call)
}

/// Position in the caller's arguments of final position `index`.
fn caller_position(def: &StageDef, index: usize) -> Result<usize> {
    match index.cmp(&def.iter_index) {
        std::cmp::Ordering::Less => Ok(index),
        std::cmp::Ordering::Greater => Ok(index - 1),
        std::cmp::Ordering::Equal => Err(PipeError::Config(format!(
            "stage '{}' wraps position {index}, which is its upstream position",
            def.name
        ))),
    }
}

fn wrap(
    def: &StageDef,
    call: &mut CallArgs,
    target: &WrapTarget,
    spread: impl Fn(&Func) -> Result<Func>,
) -> Result<()> {
    let slot = match target {
        WrapTarget::Index(index) => {
            let pos = caller_position(def, *index)?;
            let slot = call.positional.get_mut(pos).ok_or_else(|| {
                PipeError::Index(format!(
                    "stage '{}' has no argument at position {index} to wrap",
                    def.name
                ))
            })?;
            Some(slot)
        }
        WrapTarget::Name(name) => call.keywords.get_mut(name.as_str()),
    };
    let Some(slot) = slot else {
        return Ok(());
    };

    let wrapped = match &*slot {
        Arg::Func(f) if f.is_spreadable() => spread(f)?,
        Arg::Func(_) | Arg::Value(sluice_core::Value::None) => return Ok(()),
        Arg::Value(v) => {
            return Err(PipeError::Type(format!(
                "stage '{}' expected a callable at {target}, got {}",
                def.name,
                v.type_name()
            )))
        }
        Arg::Flow(_) => {
            return Err(PipeError::Type(format!(
                "stage '{}' expected a callable at {target}, got a flow",
                def.name
            )))
        }
    };
    *slot = Arg::Func(wrapped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{ErrorKind, IterFlow, Value};

    fn stage(iter_index: usize) -> StageDef {
        StageDef::through("sample", |args: CallArgs| args.flow(0)).iter_index(iter_index)
    }

    fn upstream() -> FlowRef {
        FlowRef::new(IterFlow::values(Vec::new()))
    }

    fn pair_sum() -> Func {
        Func::named("pair_sum", &["a", "b"], |args| args[0].add(&args[1]))
    }

    #[test]
    fn test_upstream_spliced_at_index() {
        let up = upstream();
        let call = CallArgs::new().value(1).value(2);
        let out = assemble(&stage(1), call, up.clone()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.flow(1).unwrap().ptr_eq(&up));
        assert_eq!(out.value_at(2).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_upstream_index_clamped() {
        let out = assemble(&stage(5), CallArgs::new(), upstream()).unwrap();
        assert!(out.flow(0).is_ok());
    }

    #[test]
    fn test_star_wrap_by_index() {
        let def = stage(1).star_wrap(0);
        let out = assemble(&def, CallArgs::new().func(pair_sum()), upstream()).unwrap();
        let f = out.func_at(0).unwrap();
        assert_eq!(f.arity(), 1);
        assert_eq!(f.call1(&Value::from((2, 3))).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_star_wrap_index_after_upstream() {
        // final layout: [upstream, value, func]
        let def = stage(0).star_wrap(2);
        let call = CallArgs::new().value(0).func(pair_sum());
        let out = assemble(&def, call, upstream()).unwrap();
        assert_eq!(out.func_at(2).unwrap().arity(), 1);
    }

    #[test]
    fn test_double_star_wrap_by_name() {
        let def = stage(0).double_star_wrap("key");
        let call = CallArgs::new().kw_func("key", pair_sum());
        let out = assemble(&def, call, upstream()).unwrap();
        let key = out.kw_func_opt("key").unwrap().unwrap();
        let row = Value::dict([("a", 1), ("b", 4)]);
        assert_eq!(key.call1(&row).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_single_param_not_wrapped() {
        let def = stage(1).star_wrap(0);
        let ident = Func::unary("ident", |v| Ok(v.clone()));
        let out = assemble(&def, CallArgs::new().func(ident), upstream()).unwrap();
        let f = out.func_at(0).unwrap();
        assert_eq!(f.name(), "ident");
    }

    #[test]
    fn test_missing_keyword_is_skipped() {
        let def = stage(0).star_wrap("key");
        assert!(assemble(&def, CallArgs::new(), upstream()).is_ok());
    }

    #[test]
    fn test_none_target_left_alone() {
        let def = stage(1).star_wrap(0);
        let out = assemble(&def, CallArgs::new().value(Value::None), upstream()).unwrap();
        assert!(out.get(0).unwrap().is_none());
    }

    #[test]
    fn test_both_directives_is_config_error() {
        let def = stage(1).star_wrap(0).double_star_wrap("key");
        let err = assemble(&def, CallArgs::new(), upstream()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_wrap_at_upstream_position_is_config_error() {
        let def = stage(1).star_wrap(1);
        let err = assemble(&def, CallArgs::new().func(pair_sum()), upstream()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_missing_positional_is_index_error() {
        let def = stage(1).star_wrap(0);
        let err = assemble(&def, CallArgs::new(), upstream()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Index);
    }

    #[test]
    fn test_non_callable_target_is_type_error() {
        let def = stage(1).star_wrap(0);
        let err = assemble(&def, CallArgs::new().value(3), upstream()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }
}
