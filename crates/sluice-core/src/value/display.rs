//! Text rendering of values.

use std::fmt::{self, Write};

use super::Value;

impl Value {
    /// Quoted representation: strings render with quotes.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = write_repr(self, &mut out);
        out
    }
}

/// Plain rendering: strings render without quotes, everything else as
/// [`Value::repr`].
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => write_repr(other, f),
        }
    }
}

fn write_repr<W: Write>(value: &Value, out: &mut W) -> fmt::Result {
    match value {
        Value::None => out.write_str("None"),
        Value::Bool(true) => out.write_str("True"),
        Value::Bool(false) => out.write_str("False"),
        Value::Int(v) => write!(out, "{}", v),
        Value::Float(v) => write_float(*v, out),
        Value::Str(s) => write_quoted(s, out),
        Value::Tuple(items) => {
            out.write_char('(')?;
            write_joined(items.iter(), out)?;
            if items.len() == 1 {
                out.write_char(',')?;
            }
            out.write_char(')')
        }
        Value::List(items) => {
            out.write_char('[')?;
            write_joined(items.iter(), out)?;
            out.write_char(']')
        }
        Value::Set(items) if items.is_empty() => out.write_str("set()"),
        Value::Set(items) => {
            out.write_char('{')?;
            write_joined(items.iter(), out)?;
            out.write_char('}')
        }
        Value::Dict(entries) => {
            out.write_char('{')?;
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_repr(k, out)?;
                out.write_str(": ")?;
                write_repr(v, out)?;
            }
            out.write_char('}')
        }
    }
}

fn write_joined<'a, W: Write>(items: impl Iterator<Item = &'a Value>, out: &mut W) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        write_repr(item, out)?;
    }
    Ok(())
}

fn write_float<W: Write>(v: f64, out: &mut W) -> fmt::Result {
    if v.is_nan() {
        out.write_str("nan")
    } else if v.is_infinite() {
        out.write_str(if v > 0.0 { "inf" } else { "-inf" })
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        write!(out, "{:.1}", v)
    } else {
        write!(out, "{}", v)
    }
}

fn write_quoted<W: Write>(s: &str, out: &mut W) -> fmt::Result {
    out.write_char('\'')?;
    for c in s.chars() {
        match c {
            '\'' => out.write_str("\\'")?,
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('\'')
}
