//! Tagged wire arguments.
//!
//! Every value bound to a `?` placeholder travels as an [`Argument`]: a
//! [`ValueType`] tag plus the canonical string encoding of the value. The tag
//! alone decides how the string is parsed back:
//!
//! | Native | Tag | Encoding |
//! |---|---|---|
//! | `bool` | `BOOL` | `True` / `False` |
//! | signed integer | `INT` | decimal |
//! | unsigned integer | `UINT` | decimal |
//! | float | `FLOAT` | shortest round-trip decimal |
//! | text | `STRING` | verbatim |
//! | bytes | `BYTES` | base64, standard alphabet |
//!
//! [`Arguments`] is the ordered list bound positionally to a statement. It
//! is built by value: every step consumes the receiver and returns a new
//! list, so two statement builds never share a mutable list.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{BOOL_FALSE, BOOL_TRUE};
use crate::error::CodecError;
use crate::value::Value;

/// Wire type tag shared by arguments and query result columns.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Invalid,
    Int,
    Uint,
    Float,
    Bool,
    String,
    Bytes,
}

impl ValueType {
    /// All tags in wire-number order.
    pub const ALL: [ValueType; 7] = [
        ValueType::Invalid,
        ValueType::Int,
        ValueType::Uint,
        ValueType::Float,
        ValueType::Bool,
        ValueType::String,
        ValueType::Bytes,
    ];

    /// Canonical upper-case tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Invalid => "INVALID",
            ValueType::Int => "INT",
            ValueType::Uint => "UINT",
            ValueType::Float => "FLOAT",
            ValueType::Bool => "BOOL",
            ValueType::String => "STRING",
            ValueType::Bytes => "BYTES",
        }
    }

    /// Numeric wire value of the tag.
    pub fn wire_number(&self) -> u8 {
        match self {
            ValueType::Invalid => 0,
            ValueType::Int => 1,
            ValueType::Uint => 2,
            ValueType::Float => 3,
            ValueType::Bool => 4,
            ValueType::String => 5,
            ValueType::Bytes => 6,
        }
    }

    /// Parse a tag as it appears on the wire.
    ///
    /// Accepts the canonical names (`INT`), the column-style names used by
    /// query responses (`IntColumn`) and the numeric form (`1`). Returns
    /// `None` for anything else.
    pub fn from_wire(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if let Ok(n) = tag.parse::<u8>() {
            return Self::ALL.into_iter().find(|t| t.wire_number() == n);
        }
        let name = tag.strip_suffix("Column").unwrap_or(tag);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One positional statement parameter in wire form.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct Argument {
    #[serde(rename = "type")]
    kind: ValueType,
    value: String,
}

impl Argument {
    /// Assemble an argument from an already-encoded wire value.
    ///
    /// No validation happens here; [`decode`](Self::decode) reports values
    /// that do not parse under their tag.
    pub fn from_parts(kind: ValueType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Encode a native value.
    ///
    /// Only scalar values are representable. `NULL`, temporal values and
    /// lists belong to the literal-escaping path and are rejected, as are
    /// non-finite floats.
    pub fn encode(value: &Value) -> Result<Self, CodecError> {
        let (kind, encoded) = match value {
            Value::Bool(b) => (ValueType::Bool, (if *b { BOOL_TRUE } else { BOOL_FALSE }).to_string()),
            Value::Int(i) => (ValueType::Int, i.to_string()),
            Value::Uint(u) => (ValueType::Uint, u.to_string()),
            Value::Float(f) => {
                if !f.is_finite() {
                    return Err(CodecError::UnsupportedArgumentType(format!(
                        "non-finite float {f}"
                    )));
                }
                (ValueType::Float, canonical_float(*f))
            }
            Value::String(s) => (ValueType::String, s.clone()),
            Value::Bytes(b) => (ValueType::Bytes, BASE64.encode(b)),
            other => {
                return Err(CodecError::UnsupportedArgumentType(
                    other.type_name().to_string(),
                ))
            }
        };
        Ok(Self {
            kind,
            value: encoded,
        })
    }

    /// Decode back into the native value selected by the tag.
    pub fn decode(&self) -> Result<Value, CodecError> {
        let context = || format!("{} argument", self.kind);
        match self.kind {
            ValueType::Int => self
                .value
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| CodecError::decode(context(), e.to_string())),
            ValueType::Uint => self
                .value
                .parse::<u64>()
                .map(Value::Uint)
                .map_err(|e| CodecError::decode(context(), e.to_string())),
            ValueType::Float => self
                .value
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| CodecError::decode(context(), e.to_string())),
            ValueType::Bool => parse_bool(&self.value)
                .map(Value::Bool)
                .ok_or_else(|| CodecError::decode(context(), format!("not a boolean: {:?}", self.value))),
            ValueType::String => Ok(Value::String(self.value.clone())),
            ValueType::Bytes => BASE64
                .decode(self.value.as_bytes())
                .map(Value::Bytes)
                .map_err(|e| CodecError::decode(context(), e.to_string())),
            ValueType::Invalid => Err(CodecError::decode(context(), "INVALID tag carries no value")),
        }
    }

    pub fn kind(&self) -> ValueType {
        self.kind
    }

    /// The encoded wire string.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Canonical decimal rendering of a finite float.
///
/// Uses the shortest representation that parses back to the same bits and
/// always keeps a fractional part or exponent (`1.0`, `1e21`).
pub(crate) fn canonical_float(f: f64) -> String {
    format!("{f:?}")
}

/// Parse the boolean spellings produced by the ledger and by this codec.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "True" | "true" | "TRUE" | "1" => Some(true),
        "False" | "false" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

/// Ordered list of arguments bound positionally to `?` placeholders.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(transparent)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Encode a sequence of native values in order.
    pub fn from_values<'a, I>(values: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        values
            .into_iter()
            .map(Argument::encode)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Return a new list with `argument` appended.
    #[must_use]
    pub fn with(mut self, argument: Argument) -> Self {
        self.0.push(argument);
        self
    }

    /// Encode `value` and return a new list with it appended.
    pub fn with_value(self, value: &Value) -> Result<Self, CodecError> {
        Ok(self.with(Argument::encode(value)?))
    }

    /// Return a new list: this list's arguments followed by `other`'s.
    #[must_use]
    pub fn merge(mut self, other: Arguments) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Argument] {
        &self.0
    }

    /// Decode every argument back to its native value, in order.
    pub fn decode_all(&self) -> Result<Vec<Value>, CodecError> {
        self.0.iter().map(Argument::decode).collect()
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Arguments {
    type Item = Argument;
    type IntoIter = std::vec::IntoIter<Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn encode_bool_uses_python_style_literals() {
        let t = Argument::encode(&Value::Bool(true)).unwrap();
        assert_eq!((t.kind(), t.value()), (ValueType::Bool, "True"));
        let f = Argument::encode(&Value::Bool(false)).unwrap();
        assert_eq!((f.kind(), f.value()), (ValueType::Bool, "False"));
    }

    #[test]
    fn encode_integers() {
        let a = Argument::encode(&Value::Int(-42)).unwrap();
        assert_eq!((a.kind(), a.value()), (ValueType::Int, "-42"));
        let a = Argument::encode(&Value::Uint(u64::MAX)).unwrap();
        assert_eq!((a.kind(), a.value()), (ValueType::Uint, "18446744073709551615"));
    }

    #[test]
    fn encode_float_keeps_fraction() {
        assert_eq!(Argument::encode(&Value::Float(1.0)).unwrap().value(), "1.0");
        assert_eq!(Argument::encode(&Value::Float(0.1)).unwrap().value(), "0.1");
    }

    #[test]
    fn encode_non_finite_float_rejected() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = Argument::encode(&Value::Float(f)).unwrap_err();
            assert!(matches!(err, CodecError::UnsupportedArgumentType(_)));
        }
    }

    #[test]
    fn encode_bytes_base64_standard() {
        let a = Argument::encode(&Value::Bytes(vec![0xfb, 0xff, 0x00])).unwrap();
        assert_eq!((a.kind(), a.value()), (ValueType::Bytes, "+/8A"));
    }

    #[test]
    fn encode_string_verbatim() {
        let a = Argument::encode(&Value::from("it's \"quoted\"")).unwrap();
        assert_eq!(a.value(), "it's \"quoted\"");
    }

    #[test]
    fn encode_rejects_non_scalars() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let elapsed = Value::Duration(chrono::TimeDelta::seconds(5));
        for v in [Value::Null, Value::Date(date), elapsed, Value::List(vec![Value::Int(1)])] {
            let err = Argument::encode(&v).unwrap_err();
            assert_eq!(err, CodecError::UnsupportedArgumentType(v.type_name().into()));
        }
    }

    #[test]
    fn decode_bool_accepts_lowercase() {
        let a = Argument::from_parts(ValueType::Bool, "false");
        assert_eq!(a.decode().unwrap(), Value::Bool(false));
    }

    #[test]
    fn decode_malformed_int_fails() {
        let a = Argument::from_parts(ValueType::Int, "12abc");
        assert!(matches!(a.decode(), Err(CodecError::Decode { .. })));
    }

    #[test]
    fn decode_invalid_tag_fails() {
        let a = Argument::from_parts(ValueType::Invalid, "x");
        assert!(a.decode().is_err());
    }

    #[test]
    fn roundtrip_scalars() {
        let values = [
            Value::Bool(true),
            Value::Int(i64::MIN),
            Value::Uint(7),
            Value::Float(-2.5e-7),
            Value::from("Book A"),
            Value::Bytes(b"\x00binary\xff".to_vec()),
        ];
        for v in values {
            assert_eq!(Argument::encode(&v).unwrap().decode().unwrap(), v);
        }
    }

    #[test]
    fn value_type_from_wire_forms() {
        assert_eq!(ValueType::from_wire("INT"), Some(ValueType::Int));
        assert_eq!(ValueType::from_wire("IntColumn"), Some(ValueType::Int));
        assert_eq!(ValueType::from_wire("BytesColumn"), Some(ValueType::Bytes));
        assert_eq!(ValueType::from_wire("5"), Some(ValueType::String));
        assert_eq!(ValueType::from_wire("DecimalColumn"), None);
        assert_eq!(ValueType::from_wire("42"), None);
    }

    #[test]
    fn argument_serializes_with_type_key() {
        let a = Argument::encode(&Value::Int(1)).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"{"type":"INT","value":"1"}"#);
    }

    #[test]
    fn arguments_with_and_merge_preserve_order() {
        let first = Arguments::new()
            .with(Argument::from_parts(ValueType::String, "a"))
            .with(Argument::from_parts(ValueType::String, "b"));
        let second = Arguments::new().with(Argument::from_parts(ValueType::Int, "1"));
        let merged = first.clone().merge(second);

        let values: Vec<&str> = merged.iter().map(Argument::value).collect();
        assert_eq!(values, vec!["a", "b", "1"]);
        // Merging a clone leaves the source list as it was.
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn arguments_from_values_stops_at_first_unsupported() {
        let values = [Value::Int(1), Value::Null, Value::Int(2)];
        assert!(Arguments::from_values(&values).is_err());
    }

    #[test]
    fn arguments_serialize_as_array() {
        let args = Arguments::from_values(&[Value::Int(1), Value::from("x")]).unwrap();
        let json = serde_json::to_string(&args).unwrap();
        assert_eq!(json, r#"[{"type":"INT","value":"1"},{"type":"STRING","value":"x"}]"#);
    }
}
