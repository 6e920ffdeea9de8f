//! Decoding tagged query responses into native rows.
//!
//! The query service returns every column as a string value plus a type tag.
//! [`RowDecoder`] maps each column to a [`Value`] according to its tag:
//!
//! | Tag | Native |
//! |---|---|
//! | `INT` | `Int`, or `Uint` when the value exceeds `i64` |
//! | `UINT` | `Uint` |
//! | `FLOAT` | `Float` |
//! | `BOOL` | `Bool` |
//! | `STRING` | `String` |
//! | `BYTES` | `Bytes` (base64 decoded) |
//! | `INVALID` | raw string passed through |
//!
//! Decoding is single-pass and order-preserving. A malformed value fails the
//! whole batch with the row index and column name in the error, so a caller
//! never receives a partially decoded response.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::argument::{parse_bool, ValueType};
use crate::error::CodecError;
use crate::value::Value;

/// One column of a query response as sent by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedColumn {
    pub column_value_type: String,
    pub value: String,
}

impl TaggedColumn {
    pub fn new(kind: ValueType, value: impl Into<String>) -> Self {
        Self {
            column_value_type: kind.as_str().to_string(),
            value: value.into(),
        }
    }
}

/// One row of a query response, keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedRow {
    pub row: BTreeMap<String, TaggedColumn>,
}

impl TaggedRow {
    pub fn with(mut self, column: impl Into<String>, tagged: TaggedColumn) -> Self {
        self.row.insert(column.into(), tagged);
        self
    }
}

/// A decoded row.
pub type ResultRow = BTreeMap<String, Value>;

/// What to do with a column whose type tag is not recognised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTagPolicy {
    /// Leave the column out of the decoded row.
    #[default]
    Drop,
    /// Fail the batch with a decode error.
    Reject,
}

/// Converts tagged rows into [`ResultRow`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct RowDecoder {
    unknown_tags: UnknownTagPolicy,
}

impl RowDecoder {
    pub fn new(unknown_tags: UnknownTagPolicy) -> Self {
        Self { unknown_tags }
    }

    pub fn unknown_tags(&self) -> UnknownTagPolicy {
        self.unknown_tags
    }

    /// Decode every row in order, stopping at the first malformed column.
    pub fn decode_rows(&self, rows: &[TaggedRow]) -> Result<Vec<ResultRow>, CodecError> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| self.decode_row(index, row))
            .collect()
    }

    /// Decode a single row. `index` only feeds error context.
    pub fn decode_row(&self, index: usize, row: &TaggedRow) -> Result<ResultRow, CodecError> {
        let mut decoded = ResultRow::new();
        for (name, column) in &row.row {
            let Some(kind) = ValueType::from_wire(&column.column_value_type) else {
                match self.unknown_tags {
                    UnknownTagPolicy::Drop => {
                        debug!(row = index, column = %name, tag = %column.column_value_type, "dropping column with unknown type tag");
                        continue;
                    }
                    UnknownTagPolicy::Reject => {
                        return Err(CodecError::decode(
                            column_context(index, name),
                            format!("unknown column type tag {:?}", column.column_value_type),
                        ));
                    }
                }
            };
            let value = decode_column(kind, &column.value)
                .map_err(|reason| CodecError::decode(column_context(index, name), reason))?;
            decoded.insert(name.clone(), value);
        }
        Ok(decoded)
    }
}

/// Decode with the default policy (unknown tags dropped).
pub fn decode_rows(rows: &[TaggedRow]) -> Result<Vec<ResultRow>, CodecError> {
    RowDecoder::default().decode_rows(rows)
}

fn decode_column(kind: ValueType, raw: &str) -> Result<Value, String> {
    match kind {
        ValueType::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| raw.parse::<u64>().map(Value::Uint))
            .map_err(|e| format!("INT {raw:?}: {e}")),
        ValueType::Uint => raw
            .parse::<u64>()
            .map(Value::Uint)
            .map_err(|e| format!("UINT {raw:?}: {e}")),
        ValueType::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| format!("FLOAT {raw:?}: {e}")),
        ValueType::Bool => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| format!("BOOL {raw:?}: not a boolean")),
        ValueType::String | ValueType::Invalid => Ok(Value::String(raw.to_string())),
        ValueType::Bytes => BASE64
            .decode(raw.as_bytes())
            .map(Value::Bytes)
            .map_err(|e| format!("BYTES: {e}")),
    }
}

fn column_context(row: usize, column: &str) -> String {
    format!("row {row}, column {column}")
}
