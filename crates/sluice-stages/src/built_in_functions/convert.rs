//! Element-wise conversions registered as map stages.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use sluice_core::{CallArgs, MapDef, PipeError, Result, Value};

use super::{extreme, sort_values, sum_values};
use crate::support::int_arg;

pub(super) fn maps() -> Vec<MapDef> {
    vec![
        MapDef::unary("dict_e", |v| to_dict(entries(v)?)),
        MapDef::unary("frozenset_e", |v| Ok(Value::set(v.items()?))),
        MapDef::unary("set_e", |v| Ok(Value::set(v.items()?))),
        MapDef::unary("list_e", |v| Ok(Value::List(v.items()?))),
        MapDef::unary("tuple_e", |v| Ok(Value::Tuple(v.items()?))),
        MapDef::unary("reversed_e", reversed),
        MapDef::unary("sorted_e", |v| Ok(Value::List(sort_values(v.items()?, None, false)?))),
        MapDef::unary("max_e", |v| extreme_of(v, "max", Ordering::Greater)),
        MapDef::unary("min_e", |v| extreme_of(v, "min", Ordering::Less)),
        MapDef::new("sum_e", |args| {
            let start = args.opt_value(1)?.unwrap_or(Value::Int(0));
            sum_values(args.value_at(0)?.items()?.into_iter().map(Ok), start)
        }),
        MapDef::unary("str", |v| Ok(Value::str(v.to_string()))),
        MapDef::unary("repr", |v| Ok(Value::str(v.repr()))),
        MapDef::unary("abs", Value::abs),
        MapDef::unary("bin", |v| radix(v, 2, "0b")),
        MapDef::unary("oct", |v| radix(v, 8, "0o")),
        MapDef::unary("hex", |v| radix(v, 16, "0x")),
        MapDef::unary("bool", |v| Ok(Value::Bool(v.truthy()))),
        MapDef::unary("chr", chr),
        MapDef::unary("ord", ord),
        MapDef::unary("float", float),
        MapDef::new("int", int),
        MapDef::unary("len", |v| Ok(Value::from(v.len()?))),
        MapDef::new("range", range),
        MapDef::new("round", round),
    ]
}

/// Mapping entries as pairs, or the items of anything else.
fn entries(v: &Value) -> Result<Vec<Value>> {
    match v {
        Value::Dict(d) => Ok(d
            .iter()
            .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
            .collect()),
        other => other.items(),
    }
}

/// Builds a mapping from two-item sequences.
pub(super) fn to_dict(items: Vec<Value>) -> Result<Value> {
    let mut entries = BTreeMap::new();
    for (i, item) in items.into_iter().enumerate() {
        let pair = match item {
            Value::Tuple(p) | Value::List(p) => p,
            Value::Str(_) | Value::Set(_) | Value::Dict(_) => item.into_items()?,
            other => {
                return Err(PipeError::Type(format!(
                    "cannot convert dictionary update sequence element #{i} to a sequence ({})",
                    other.type_name()
                )))
            }
        };
        let [k, v]: [Value; 2] = pair.try_into().map_err(|p: Vec<Value>| {
            PipeError::Value(format!(
                "dictionary update sequence element #{i} has length {}; 2 is required",
                p.len()
            ))
        })?;
        entries.insert(k, v);
    }
    Ok(Value::Dict(entries))
}

fn reversed(v: &Value) -> Result<Value> {
    match v {
        Value::Set(_) => Err(PipeError::Type("'set' object is not reversible".to_string())),
        other => {
            let mut items = other.items()?;
            items.reverse();
            Ok(Value::List(items))
        }
    }
}

fn extreme_of(v: &Value, name: &str, want: Ordering) -> Result<Value> {
    extreme(v.items()?.into_iter().map(Ok), None, want)?
        .ok_or_else(|| PipeError::Value(format!("{name}() arg is an empty sequence")))
}

fn integer(v: &Value) -> Result<i64> {
    v.as_int().ok_or_else(|| {
        PipeError::Type(format!(
            "'{}' object cannot be interpreted as an integer",
            v.type_name()
        ))
    })
}

fn radix(v: &Value, base: u32, prefix: &str) -> Result<Value> {
    let n = integer(v)?;
    let sign = if n < 0 { "-" } else { "" };
    let magnitude = n.unsigned_abs();
    let digits = match base {
        2 => format!("{magnitude:b}"),
        8 => format!("{magnitude:o}"),
        _ => format!("{magnitude:x}"),
    };
    Ok(Value::str(format!("{sign}{prefix}{digits}")))
}

fn chr(v: &Value) -> Result<Value> {
    let n = integer(v)?;
    u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::str(c.to_string()))
        .ok_or_else(|| PipeError::Value("chr() arg not in range(0x110000)".to_string()))
}

fn ord(v: &Value) -> Result<Value> {
    let s = v.as_str().ok_or_else(|| {
        PipeError::Type(format!(
            "ord() expected string of length 1, but {} found",
            v.type_name()
        ))
    })?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
        _ => Err(PipeError::Type(format!(
            "ord() expected a character, but string of length {} found",
            s.chars().count()
        ))),
    }
}

fn float(v: &Value) -> Result<Value> {
    if let Some(f) = v.as_float() {
        return Ok(Value::Float(f));
    }
    match v {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| {
                PipeError::Value(format!("could not convert string to float: {}", v.repr()))
            }),
        other => Err(PipeError::Type(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

/// `int(base=10)`: truncates floats and parses strings. Base 0 reads the
/// base from a `0b`, `0o` or `0x` prefix.
fn int(args: &CallArgs) -> Result<Value> {
    let v = args.value_at(0)?;
    let base = match args.opt_value(1)? {
        Some(b) => Some(int_arg(&b, "int() base")?),
        None => args
            .kw_value_opt("base")?
            .map(|b| int_arg(&b, "int() base"))
            .transpose()?,
    };
    match (&v, base) {
        (Value::Str(s), base) => parse_int(s, base.unwrap_or(10)),
        (_, Some(_)) => Err(PipeError::Type(
            "int() can't convert non-string with explicit base".to_string(),
        )),
        (Value::Float(f), None) => {
            if f.is_nan() {
                Err(PipeError::Value("cannot convert float NaN to integer".to_string()))
            } else if f.is_infinite() || f.abs() >= 9.223_372_036_854_776e18 {
                Err(PipeError::Value("cannot convert float infinity to integer".to_string()))
            } else {
                Ok(Value::Int(f.trunc() as i64))
            }
        }
        (other, None) => other.as_int().map(Value::Int).ok_or_else(|| {
            PipeError::Type(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn parse_int(text: &str, base: i64) -> Result<Value> {
    let invalid = || {
        PipeError::Value(format!(
            "invalid literal for int() with base {base}: {}",
            Value::str(text).repr()
        ))
    };
    if base != 0 && !(2..=36).contains(&base) {
        return Err(PipeError::Value("int() base must be >= 2 and <= 36, or 0".to_string()));
    }
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let lower = body.to_ascii_lowercase();
    let prefixed = [("0b", 2u32), ("0o", 8), ("0x", 16)]
        .into_iter()
        .find(|(p, b)| lower.starts_with(p) && (base == 0 || base == i64::from(*b)));
    let (digits, digits_base) = match prefixed {
        Some((_, b)) => (&body[2..], b),
        None if base == 0 => (body, 10),
        None => (body, base as u32),
    };
    if digits.is_empty() || digits.starts_with(['+', '-', '_']) {
        return Err(invalid());
    }
    let sign = if negative { "-" } else { "" };
    let signed = format!("{sign}{}", digits.replace('_', ""));
    i64::from_str_radix(&signed, digits_base)
        .map(Value::Int)
        .map_err(|_| invalid())
}

/// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`, with
/// the element as the first argument. Produces a list.
fn range(args: &CallArgs) -> Result<Value> {
    let bounds = (0..args.len())
        .map(|i| integer(&args.value_at(i)?))
        .collect::<Result<Vec<_>>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(PipeError::Type(format!(
                "range expected at most 3 arguments, got {}",
                bounds.len()
            )))
        }
    };
    if step == 0 {
        return Err(PipeError::Value("range() arg 3 must not be zero".to_string()));
    }
    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(Value::Int(i));
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::List(out))
}

/// `round(ndigits=None)`, rounding half to even. Without `ndigits` the
/// result is an integer.
fn round(args: &CallArgs) -> Result<Value> {
    let v = args.value_at(0)?;
    let ndigits = match args.opt_value(1)? {
        Some(Value::None) | None => args
            .kw_value_opt("ndigits")?
            .filter(|n| !n.is_none())
            .map(|n| int_arg(&n, "round() ndigits"))
            .transpose()?,
        Some(n) => Some(int_arg(&n, "round() ndigits")?),
    };
    match (v, ndigits) {
        (Value::Float(f), None) => {
            if !f.is_finite() {
                return Err(PipeError::Value(format!("cannot convert float {f} to integer")));
            }
            Ok(Value::Int(f.round_ties_even() as i64))
        }
        (Value::Float(f), Some(n)) => {
            let scale = 10f64.powi(n.clamp(-308, 308) as i32);
            Ok(Value::Float((f * scale).round_ties_even() / scale))
        }
        (v, ndigits) => {
            let i = v.as_int().ok_or_else(|| {
                PipeError::Type(format!(
                    "type {} doesn't define __round__ method",
                    v.type_name()
                ))
            })?;
            Ok(Value::Int(match ndigits {
                Some(n) if n < 0 => round_int(i, n.unsigned_abs()),
                _ => i,
            }))
        }
    }
}

fn round_int(i: i64, digits: u64) -> i64 {
    let Some(scale) = u32::try_from(digits).ok().and_then(|d| 10i64.checked_pow(d)) else {
        return 0;
    };
    let quotient = i.div_euclid(scale);
    let remainder = i.rem_euclid(scale);
    let rounded = match (remainder * 2).cmp(&scale) {
        Ordering::Less => quotient,
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient % 2 == 0 => quotient,
        Ordering::Equal => quotient + 1,
    };
    rounded.saturating_mul(scale)
}
