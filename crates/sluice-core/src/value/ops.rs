//! Arithmetic on values.

use crate::error::{PipeError, Result};

use super::Value;

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Value {
    fn num(&self) -> Option<Num> {
        match self {
            Value::Int(v) => Some(Num::Int(*v)),
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Float(v) => Some(Num::Float(*v)),
            _ => None,
        }
    }

    /// `self + other`: numeric addition or sequence/string concatenation.
    pub fn add(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::from(format!("{}{}", a, b))),
            (Value::Tuple(a), Value::Tuple(b)) => Ok(Value::Tuple(concat(a, b))),
            (Value::List(a), Value::List(b)) => Ok(Value::List(concat(a, b))),
            _ => numeric(self, other, "+", i64::checked_add, |a, b| a + b),
        }
    }

    /// `self - other`.
    pub fn sub(&self, other: &Value) -> Result<Value> {
        numeric(self, other, "-", i64::checked_sub, |a, b| a - b)
    }

    /// `self * other`: numeric product or sequence/string repetition.
    pub fn mul(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                Ok(Value::from(repeat_str(s, *n)?))
            }
            (Value::Tuple(v), Value::Int(n)) | (Value::Int(n), Value::Tuple(v)) => {
                Ok(Value::Tuple(repeat(v, *n)?))
            }
            (Value::List(v), Value::Int(n)) | (Value::Int(n), Value::List(v)) => {
                Ok(Value::List(repeat(v, *n)?))
            }
            _ => numeric(self, other, "*", i64::checked_mul, |a, b| a * b),
        }
    }

    /// `self / other`, always producing a float.
    pub fn truediv(&self, other: &Value) -> Result<Value> {
        let (a, b) = floats(self, other, "/")?;
        if b == 0.0 {
            return Err(PipeError::ZeroDivision);
        }
        Ok(Value::Float(a / b))
    }

    /// `self // other`, rounding toward negative infinity.
    pub fn floordiv(&self, other: &Value) -> Result<Value> {
        match (self.num(), other.num()) {
            (Some(Num::Int(_)), Some(Num::Int(0))) => Err(PipeError::ZeroDivision),
            (Some(Num::Int(a)), Some(Num::Int(b))) => {
                let q = a.checked_div(b).ok_or_else(overflow)?;
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    Ok(Value::Int(q - 1))
                } else {
                    Ok(Value::Int(q))
                }
            }
            _ => {
                let (a, b) = floats(self, other, "//")?;
                if b == 0.0 {
                    return Err(PipeError::ZeroDivision);
                }
                Ok(Value::Float((a / b).floor()))
            }
        }
    }

    /// `self % other`; the result takes the sign of the divisor.
    pub fn rem(&self, other: &Value) -> Result<Value> {
        match (self.num(), other.num()) {
            (Some(Num::Int(_)), Some(Num::Int(0))) => Err(PipeError::ZeroDivision),
            (Some(Num::Int(a)), Some(Num::Int(b))) => {
                let r = a.checked_rem(b).ok_or_else(overflow)?;
                if r != 0 && ((r < 0) != (b < 0)) {
                    Ok(Value::Int(r + b))
                } else {
                    Ok(Value::Int(r))
                }
            }
            _ => {
                let (a, b) = floats(self, other, "%")?;
                if b == 0.0 {
                    return Err(PipeError::ZeroDivision);
                }
                Ok(Value::Float(a - b * (a / b).floor()))
            }
        }
    }

    /// `-self`.
    pub fn neg(&self) -> Result<Value> {
        match self.num() {
            Some(Num::Int(v)) => v.checked_neg().map(Value::Int).ok_or_else(overflow),
            Some(Num::Float(v)) => Ok(Value::Float(-v)),
            None => Err(PipeError::Type(format!(
                "bad operand type for unary -: '{}'",
                self.type_name()
            ))),
        }
    }

    /// `abs(self)`.
    pub fn abs(&self) -> Result<Value> {
        match self.num() {
            Some(Num::Int(v)) => v.checked_abs().map(Value::Int).ok_or_else(overflow),
            Some(Num::Float(v)) => Ok(Value::Float(v.abs())),
            None => Err(PipeError::Type(format!(
                "bad operand type for abs(): '{}'",
                self.type_name()
            ))),
        }
    }
}

fn overflow() -> PipeError {
    PipeError::Value("integer overflow".to_string())
}

fn unsupported(op: &str, a: &Value, b: &Value) -> PipeError {
    PipeError::Type(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        a.type_name(),
        b.type_name()
    ))
}

fn numeric(
    a: &Value,
    b: &Value,
    op: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (a.num(), b.num()) {
        (Some(Num::Int(x)), Some(Num::Int(y))) => int_op(x, y).map(Value::Int).ok_or_else(overflow),
        (Some(_), Some(_)) => {
            let (x, y) = floats(a, b, op)?;
            Ok(Value::Float(float_op(x, y)))
        }
        _ => Err(unsupported(op, a, b)),
    }
}

fn floats(a: &Value, b: &Value, op: &str) -> Result<(f64, f64)> {
    match (a.num(), b.num()) {
        (Some(_), Some(_)) => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(unsupported(op, a, b)),
        },
        _ => Err(unsupported(op, a, b)),
    }
}

fn concat(a: &[Value], b: &[Value]) -> Vec<Value> {
    a.iter().chain(b.iter()).cloned().collect()
}

/// Repetition count for a sequence of `len` items, or zero when the result
/// is empty anyway.
fn repeat_count(len: usize, n: i64) -> Result<usize> {
    let times = usize::try_from(n).unwrap_or(0);
    if len == 0 || times == 0 {
        return Ok(0);
    }
    len.checked_mul(times)
        .map(|_| times)
        .ok_or_else(too_long)
}

fn too_long() -> PipeError {
    PipeError::Value("repeated sequence is too long".to_string())
}

fn repeat(v: &[Value], n: i64) -> Result<Vec<Value>> {
    let times = repeat_count(v.len(), n)?;
    let mut out = Vec::new();
    out.try_reserve_exact(v.len() * times)
        .map_err(|_| too_long())?;
    for _ in 0..times {
        out.extend_from_slice(v);
    }
    Ok(out)
}

fn repeat_str(s: &str, n: i64) -> Result<String> {
    let times = repeat_count(s.len(), n)?;
    let mut out = String::new();
    out.try_reserve_exact(s.len() * times)
        .map_err(|_| too_long())?;
    for _ in 0..times {
        out.push_str(s);
    }
    Ok(out)
}
