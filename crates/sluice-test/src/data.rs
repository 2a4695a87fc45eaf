//! Sample input sequences.

use sluice_core::Value;

/// `((1, 2), (3, 4), (5, 6))`
pub fn pairs() -> Vec<Value> {
    vec![
        Value::from((1, 2)),
        Value::from((3, 4)),
        Value::from((5, 6)),
    ]
}

/// Dicts keyed by `"a"` and `"b"`.
pub fn keyed_dicts() -> Vec<Value> {
    vec![
        Value::dict([("a", 1), ("b", 2)]),
        Value::dict([("a", 3), ("b", 4)]),
        Value::dict([("a", 5), ("b", 6)]),
    ]
}

/// Integers in the given order.
pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&i| Value::Int(i)).collect()
}
