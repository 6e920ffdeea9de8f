//! Literal escaping for SQL text that cannot use placeholders.
//!
//! Ad hoc filters sometimes need a value inlined into the statement text.
//! [`literal`] renders a [`Value`] so that it cannot terminate the
//! surrounding string or inject further SQL. A value is either bound as an
//! [`Argument`](crate::argument::Argument) or escaped here, never both.

use chrono::Timelike;
use std::fmt::Write;

use crate::argument::canonical_float;
use crate::error::{CodecError, CoreError, StatementError};
use crate::statement::placeholder_positions;
use crate::value::Value;

/// Escape `s` for use inside a quoted literal, without adding the quotes.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out
}

/// Render a value as a SQL literal.
///
/// Strings are single-quoted and escaped, bytes become a hex literal
/// (`X'00ff'`), booleans render as `1`/`0`, floats always carry an
/// exponent (`1.5e0`), temporal values are quoted ISO forms with a
/// microsecond fraction only when non-zero, and lists render as a
/// parenthesised comma-separated group for `IN (...)`.
///
/// Durations render as `'[-]HH:MM:SS[.ffffff]'`; hours are not wrapped at
/// 24, so two days and one hour is `'49:00:00'`.
pub fn literal(value: &Value) -> Result<String, CodecError> {
    let rendered = match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(CodecError::UnsupportedArgumentType(format!(
                    "{f} can not be used as a SQL literal"
                )));
            }
            let mut s = canonical_float(*f);
            if !s.contains('e') {
                s.push_str("e0");
            }
            s
        }
        Value::String(s) => format!("'{}'", escape_string(s)),
        Value::Bytes(b) => format!("X'{}'", hex::encode(b)),
        Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        Value::DateTime(dt) => {
            let mut s = format!("'{}", dt.format("%Y-%m-%d %H:%M:%S"));
            push_micros(&mut s, dt.nanosecond());
            s.push('\'');
            s
        }
        Value::Time(t) => {
            let mut s = format!("'{}", t.format("%H:%M:%S"));
            push_micros(&mut s, t.nanosecond());
            s.push('\'');
            s
        }
        Value::Duration(d) => {
            let micros = d.num_microseconds().ok_or_else(|| {
                CodecError::UnsupportedArgumentType(format!("duration {d} overflows microseconds"))
            })?;
            let sign = if micros < 0 { "-" } else { "" };
            let micros = micros.unsigned_abs();
            let secs = micros / 1_000_000;
            let mut s = format!("'{sign}{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
            push_micros(&mut s, ((micros % 1_000_000) * 1_000) as u32);
            s.push('\'');
            s
        }
        Value::List(items) => {
            let parts = items.iter().map(literal).collect::<Result<Vec<_>, _>>()?;
            format!("({})", parts.join(","))
        }
    };
    Ok(rendered)
}

/// Substitute each `?` outside quoted text in `template` with the escaped
/// literal of the corresponding value.
pub fn format_sql(template: &str, values: &[Value]) -> Result<String, CoreError> {
    let positions = placeholder_positions(template);
    if positions.len() != values.len() {
        return Err(StatementError::PlaceholderMismatch {
            placeholders: positions.len(),
            arguments: values.len(),
        }
        .into());
    }

    let mut out = String::with_capacity(template.len() + values.len() * 8);
    let mut cursor = 0;
    for (position, value) in positions.into_iter().zip(values) {
        out.push_str(&template[cursor..position]);
        out.push_str(&literal(value)?);
        cursor = position + 1;
    }
    out.push_str(&template[cursor..]);
    Ok(out)
}

fn push_micros(out: &mut String, nanos: u32) {
    // Leap-second nanos exceed 10^9; keep the fraction within six digits.
    let micros = (nanos % 1_000_000_000) / 1_000;
    if micros != 0 {
        let _ = write!(out, ".{micros:06}");
    }
}
