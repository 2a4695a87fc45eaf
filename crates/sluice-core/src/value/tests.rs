//! Tests for dynamic values.

use super::*;
use crate::error::ErrorKind;

#[test]
fn test_numbers_compare_across_int_and_float() {
    assert_eq!(Value::Int(2), Value::Float(2.0));
    assert!(Value::Int(1) < Value::Float(1.5));
    assert!(Value::Float(-0.5) < Value::Int(0));
}

#[test]
fn test_unrelated_types_order_by_rank() {
    let mut values = vec![Value::str("a"), Value::Int(3), Value::None, Value::Bool(true)];
    values.sort();
    assert_eq!(
        values,
        vec![Value::None, Value::Bool(true), Value::Int(3), Value::str("a")]
    );
}

#[test]
fn test_tuples_compare_lexicographically() {
    assert!(Value::from((1, 2)) < Value::from((1, 3)));
    assert!(Value::from((0, 9)) < Value::from((1, 0)));
}

#[test]
fn test_truthiness() {
    assert!(!Value::None.truthy());
    assert!(!Value::Int(0).truthy());
    assert!(!Value::tuple(Vec::<Value>::new()).truthy());
    assert!(Value::str("x").truthy());
    assert!(Value::Float(0.1).truthy());
}

#[test]
fn test_items_of_each_iterable() {
    assert_eq!(
        Value::from((1, 2)).items().unwrap(),
        vec![Value::Int(1), Value::Int(2)]
    );
    assert_eq!(
        Value::dict([("b", 2), ("a", 1)]).items().unwrap(),
        vec![Value::str("a"), Value::str("b")]
    );
    assert_eq!(
        Value::str("hi").items().unwrap(),
        vec![Value::str("h"), Value::str("i")]
    );
    let err = Value::Int(4).items().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_index() {
    let pair = Value::from((10, 20));
    assert_eq!(pair.index(&Value::Int(1)).unwrap(), Value::Int(20));
    assert_eq!(pair.index(&Value::Int(-2)).unwrap(), Value::Int(10));
    assert_eq!(pair.index(&Value::Int(2)).unwrap_err().kind(), ErrorKind::Index);

    let d = Value::dict([("a", 1)]);
    assert_eq!(d.index(&Value::str("a")).unwrap(), Value::Int(1));
    assert_eq!(d.index(&Value::str("z")).unwrap_err().kind(), ErrorKind::Key);
}

#[test]
fn test_with_entry_replaces_key() {
    let d = Value::dict([("a", 1), ("b", 2)]);
    let d = d.with_entry(Value::str("b"), Value::Int(4)).unwrap();
    assert_eq!(d, Value::dict([("a", 1), ("b", 4)]));
}

#[test]
fn test_repr_and_display() {
    assert_eq!(Value::from((1, "a")).repr(), "(1, 'a')");
    assert_eq!(Value::tuple([5]).repr(), "(5,)");
    assert_eq!(Value::list([1.0, 2.5]).repr(), "[1.0, 2.5]");
    assert_eq!(Value::set(Vec::<Value>::new()).repr(), "set()");
    assert_eq!(Value::dict([("k", true)]).repr(), "{'k': True}");
    assert_eq!(Value::str("plain").to_string(), "plain");
    assert_eq!(Value::None.to_string(), "None");
}

#[test]
fn test_arithmetic() {
    assert_eq!(Value::Int(2).add(&Value::Int(3)).unwrap(), Value::Int(5));
    assert_eq!(Value::Int(2).add(&Value::Float(0.5)).unwrap(), Value::Float(2.5));
    assert_eq!(Value::str("a").add(&Value::str("b")).unwrap(), Value::str("ab"));
    assert_eq!(Value::Int(7).floordiv(&Value::Int(-2)).unwrap(), Value::Int(-4));
    assert_eq!(Value::Int(-7).rem(&Value::Int(3)).unwrap(), Value::Int(2));
    assert_eq!(Value::Int(1).truediv(&Value::Int(4)).unwrap(), Value::Float(0.25));
    assert_eq!(
        Value::Int(1).truediv(&Value::Int(0)).unwrap_err(),
        PipeError::ZeroDivision
    );
    assert_eq!(
        Value::str("a").sub(&Value::Int(1)).unwrap_err().kind(),
        ErrorKind::Type
    );
    assert_eq!(
        Value::Int(i64::MAX).add(&Value::Int(1)).unwrap_err().kind(),
        ErrorKind::Value
    );
}

#[test]
fn test_repetition() {
    assert_eq!(Value::str("ab").mul(&Value::Int(2)).unwrap(), Value::str("abab"));
    assert_eq!(
        Value::Int(2).mul(&Value::tuple([1])).unwrap(),
        Value::tuple([1, 1])
    );
    assert_eq!(Value::list([1]).mul(&Value::Int(-3)).unwrap(), Value::List(vec![]));
    let empty = Value::List(vec![]);
    assert_eq!(empty.mul(&Value::Int(i64::MAX)).unwrap(), Value::List(vec![]));
}

#[test]
fn test_repetition_too_long_is_an_error() {
    let huge = Value::Int(i64::MAX);
    assert_eq!(Value::tuple([1, 2]).mul(&huge).unwrap_err().kind(), ErrorKind::Value);
    assert_eq!(huge.mul(&Value::list([1, 2, 3])).unwrap_err().kind(), ErrorKind::Value);
    assert_eq!(Value::str("ab").mul(&huge).unwrap_err().kind(), ErrorKind::Value);
}
