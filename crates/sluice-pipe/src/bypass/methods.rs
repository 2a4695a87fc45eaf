//! Standard bypass kinds.

use sluice_core::{PipeError, Result, Value};

use super::BypassDef;

/// Every standard bypass, in registration order.
pub fn standard() -> Vec<BypassDef> {
    vec![carry_key(), keyed(), carry_value(), carry_dict(), dict_key()]
}

/// `carry_key` .. `re_key`: carries element 0 of a pair, passes element 1.
pub fn carry_key() -> BypassDef {
    BypassDef::new(
        "carry_key",
        |pair, _| Ok((pair.index(&Value::Int(0))?, pair.index(&Value::Int(1))?)),
        |key, result, _| Ok(Value::tuple([key, result])),
    )
    .closed_by("re_key")
}

/// `keyed`: pairs each element with the result of the next stage.
pub fn keyed() -> BypassDef {
    BypassDef::new(
        "keyed",
        |value, _| Ok((value.clone(), value)),
        |key, result, _| Ok(Value::tuple([key, result])),
    )
}

/// `carry_value` .. `re_value`: carries element 1 of a pair, passes element 0.
pub fn carry_value() -> BypassDef {
    BypassDef::new(
        "carry_value",
        |pair, _| Ok((pair.index(&Value::Int(1))?, pair.index(&Value::Int(0))?)),
        |value, result, _| Ok(Value::tuple([result, value])),
    )
    .closed_by("re_value")
}

/// `carry_dict[key]` .. `return_dict`: passes one entry of a mapping and
/// writes the result back under the same key.
pub fn carry_dict() -> BypassDef {
    BypassDef::new(
        "carry_dict",
        |dict, key| split_entry("carry_dict", dict, key),
        |dict, result, key| merge_entry("carry_dict", dict, result, key),
    )
    .closed_by("return_dict")
}

/// `dict_key[key]`: single-stage form of `carry_dict`.
pub fn dict_key() -> BypassDef {
    BypassDef::new(
        "dict_key",
        |dict, key| split_entry("dict_key", dict, key),
        |dict, result, key| merge_entry("dict_key", dict, result, key),
    )
}

fn require_key<'k>(name: &str, key: Option<&'k Value>) -> Result<&'k Value> {
    key.ok_or_else(|| PipeError::Config(format!("{name} needs a key")))
}

fn split_entry(name: &str, dict: Value, key: Option<&Value>) -> Result<(Value, Value)> {
    let payload = dict.index(require_key(name, key)?)?;
    Ok((dict, payload))
}

fn merge_entry(name: &str, dict: Value, result: Value, key: Option<&Value>) -> Result<Value> {
    dict.with_entry(require_key(name, key)?.clone(), result)
}
