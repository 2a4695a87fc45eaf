//! Operators as map stages: `add(2)` maps `e` to `e + 2`.
//!
//! Comparisons use the total order of [`Value`], so mixed types compare by
//! type rank instead of failing.

use std::cmp::Ordering;

use sluice_core::{AddIn, CallArgs, MapDef, Result, Value};

pub const NAME: &str = "operator_pipes";

pub fn add_in() -> AddIn {
    let binaries: [(&str, fn(&Value, &Value) -> Result<Value>); 7] = [
        ("add", Value::add),
        ("sub", Value::sub),
        ("mul", Value::mul),
        ("truediv", Value::truediv),
        ("floordiv", Value::floordiv),
        ("mod", Value::rem),
        ("getitem", Value::index),
    ];
    let comparisons: [(&str, fn(Ordering) -> bool); 6] = [
        ("eq", Ordering::is_eq),
        ("ne", Ordering::is_ne),
        ("lt", Ordering::is_lt),
        ("le", Ordering::is_le),
        ("gt", Ordering::is_gt),
        ("ge", Ordering::is_ge),
    ];
    let add_in = AddIn::new(NAME)
        .map(MapDef::unary("neg", Value::neg))
        .map(MapDef::unary("not_", |v| Ok(Value::Bool(!v.truthy()))));
    let add_in = binaries.into_iter().fold(add_in, |add_in, (name, op)| {
        add_in.map(MapDef::new(name, move |args: &CallArgs| {
            op(&args.value_at(0)?, &args.value_at(1)?)
        }))
    });
    comparisons.into_iter().fold(add_in, |add_in, (name, test)| {
        add_in.map(MapDef::new(name, move |args: &CallArgs| {
            let ordering = args.value_at(0)?.cmp(&args.value_at(1)?);
            Ok(Value::Bool(test(ordering)))
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{apply_map, map_def};
    use sluice_core::ErrorKind;

    fn apply(name: &str, element: impl Into<Value>, operand: impl Into<Value>) -> Result<Value> {
        apply_map(
            &map_def(&add_in(), name),
            element.into(),
            CallArgs::new().value(operand),
        )
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(apply("add", 1, 2).unwrap(), Value::Int(3));
        assert_eq!(apply("sub", 1, 2).unwrap(), Value::Int(-1));
        assert_eq!(apply("mul", "ab", 2).unwrap(), Value::str("abab"));
        assert_eq!(apply("truediv", 1, 2).unwrap(), Value::Float(0.5));
        assert_eq!(apply("floordiv", -7, 2).unwrap(), Value::Int(-4));
        assert_eq!(apply("mod", -7, 2).unwrap(), Value::Int(1));
        assert_eq!(apply("truediv", 1, 0).unwrap_err().kind(), ErrorKind::ZeroDivision);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(apply("lt", 1, 2).unwrap(), Value::Bool(true));
        assert_eq!(apply("ge", 1, 2).unwrap(), Value::Bool(false));
        assert_eq!(apply("eq", 2, 2.0).unwrap(), Value::Bool(true));
        assert_eq!(apply("ne", "a", "b").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_unary_and_getitem() {
        let add_in = add_in();
        let neg = map_def(&add_in, "neg");
        assert_eq!(apply_map(&neg, Value::Int(3), CallArgs::new()).unwrap(), Value::Int(-3));
        let not = map_def(&add_in, "not_");
        assert_eq!(apply_map(&not, Value::Int(0), CallArgs::new()).unwrap(), Value::Bool(true));
        assert_eq!(apply("getitem", Value::tuple([4, 5]), -1).unwrap(), Value::Int(5));
    }
}
