//! Parameterized statement builders.
//!
//! Builders never inline values into SQL text. Each value is encoded into an
//! [`Argument`](crate::argument::Argument) and bound to a `?` placeholder; the
//! only caller text that reaches the statement is table and column names,
//! which are validated as identifiers.
//!
//! | Builder | Statement shape |
//! |---|---|
//! | [`build_batch_insert`] | `INSERT INTO db.t (a,b) VALUES (?,?),(?,?)` |
//! | [`build_update`] | `UPDATE db.t SET a=?,b=? WHERE c=? AND d=?` |
//! | [`build_delete`] | `DELETE FROM db.t WHERE c=? [ORDER BY o ASC\|DESC] LIMIT n` |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;

use crate::argument::{Argument, Arguments};
use crate::constants::{MAX_DELETE_ROWS, PLACEHOLDER};
use crate::error::StatementError;
use crate::value::Value;

/// SQL text with positional placeholders and the arguments bound to them.
///
/// Construction checks that the placeholder count equals the argument count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    sql: String,
    arguments: Arguments,
}

impl Statement {
    /// Pair SQL text with its arguments.
    ///
    /// Placeholders inside quoted literals, quoted identifiers and comments
    /// are not counted.
    pub fn new(sql: impl Into<String>, arguments: Arguments) -> Result<Self, StatementError> {
        let sql = sql.into();
        let placeholders = placeholder_positions(&sql).len();
        if placeholders != arguments.len() {
            return Err(StatementError::PlaceholderMismatch {
                placeholders,
                arguments: arguments.len(),
            });
        }
        Ok(Self { sql, arguments })
    }

    /// A statement without arguments (DDL and similar).
    pub fn raw(sql: impl Into<String>) -> Result<Self, StatementError> {
        Self::new(sql, Arguments::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn into_parts(self) -> (String, Arguments) {
        (self.sql, self.arguments)
    }
}

/// Build a single-row INSERT. Equivalent to a one-row batch.
pub fn build_insert<C: AsRef<str>>(
    table: &str,
    columns: &[C],
    values: Vec<Value>,
) -> Result<Statement, StatementError> {
    build_batch_insert(table, columns, &[values])
}

/// Build a multi-row INSERT.
///
/// `table` is the fully qualified `database.table`. Column names must be
/// distinct and every row must supply exactly one value per column. Arguments are bound row-major: all of row
/// 0 in column order, then row 1, and so on.
pub fn build_batch_insert<C: AsRef<str>>(
    table: &str,
    columns: &[C],
    rows: &[Vec<Value>],
) -> Result<Statement, StatementError> {
    validate_identifier(table)?;
    if columns.is_empty() {
        return Err(StatementError::EmptyColumnSet);
    }
    if rows.is_empty() {
        return Err(StatementError::EmptyRows);
    }
    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        let column = column.as_ref();
        validate_identifier(column)?;
        if !seen.insert(column) {
            return Err(StatementError::DuplicateColumn(column.to_string()));
        }
    }

    let mut arguments = Arguments::new();
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            return Err(StatementError::ColumnCountMismatch {
                row: row_index,
                expected: columns.len(),
                got: row.len(),
            });
        }
        for (column, value) in columns.iter().zip(row) {
            arguments = arguments.with(encode_for(column.as_ref(), value)?);
        }
    }

    let column_list = columns.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
    let group = format!("({})", vec!["?"; columns.len()].join(","));
    let groups = vec![group.as_str(); rows.len()].join(",");
    let sql = format!("INSERT INTO {table} ({column_list}) VALUES {groups}");

    Statement::new(sql, arguments)
}

/// Build an UPDATE with AND-conjoined equality conditions.
///
/// Arguments are the SET values in the given order followed by the WHERE
/// values. An empty `conditions` slice is rejected like an empty DELETE
/// filter: an unconditional UPDATE is never produced.
pub fn build_update<K: AsRef<str>, W: AsRef<str>>(
    database: &str,
    table: &str,
    columns: &[(K, Value)],
    conditions: &[(W, Value)],
) -> Result<Statement, StatementError> {
    let qualified = qualify(database, table)?;
    if columns.is_empty() {
        return Err(StatementError::EmptyColumnSet);
    }
    if conditions.is_empty() {
        return Err(StatementError::EmptyWhereClause { table: qualified });
    }

    let (assignments, set_args) = equalities(columns, ",")?;
    let (filter, where_args) = equalities(conditions, " AND ")?;
    let sql = format!("UPDATE {qualified} SET {assignments} WHERE {filter}");

    Statement::new(sql, set_args.merge(where_args))
}

/// Build a bounded DELETE.
///
/// Refuses an empty filter and any `limit` above [`MAX_DELETE_ROWS`].
/// `ORDER BY` is emitted only when `order_by` is given; `LIMIT` is always
/// emitted.
pub fn build_delete<W: AsRef<str>>(
    database: &str,
    table: &str,
    conditions: &[(W, Value)],
    order_by: Option<&str>,
    ascending: bool,
    limit: u64,
) -> Result<Statement, StatementError> {
    let qualified = qualify(database, table)?;
    if conditions.is_empty() {
        return Err(StatementError::EmptyWhereClause { table: qualified });
    }
    if limit > MAX_DELETE_ROWS {
        return Err(StatementError::LimitExceeded {
            limit,
            max: MAX_DELETE_ROWS,
        });
    }

    let (filter, arguments) = equalities(conditions, " AND ")?;
    let mut sql = format!("DELETE FROM {qualified} WHERE {filter}");
    if let Some(column) = order_by.filter(|c| !c.is_empty()) {
        validate_identifier(column)?;
        let direction = if ascending { "ASC" } else { "DESC" };
        // Writing into a String cannot fail.
        let _ = write!(sql, " ORDER BY {column} {direction}");
    }
    let _ = write!(sql, " LIMIT {limit}");

    Statement::new(sql, arguments)
}

/// Check that a table or column name is safe to interpolate.
///
/// The name is split on `.` (for `database.table`). Each segment is either
/// bare (letters, digits, `_`, `$`) or the same characters wrapped in one
/// pair of backticks. Anything that could end a token, open a literal or
/// introduce a placeholder is refused.
pub fn validate_identifier(name: &str) -> Result<(), StatementError> {
    if name.split('.').all(valid_segment) {
        Ok(())
    } else {
        Err(StatementError::InvalidIdentifier(name.to_string()))
    }
}

fn valid_segment(segment: &str) -> bool {
    let bare = |s: &str| {
        !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '$'))
    };
    match segment.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        Some(inner) => bare(inner),
        None => bare(segment),
    }
}

#[derive(Clone, Copy)]
enum Scan {
    Code,
    Quoted(char),
    Escaped(char),
    LineComment,
    BlockComment,
}

/// Byte offsets of every placeholder outside quoted text and comments.
///
/// Recognises `'...'`, `"..."` and `` `...` `` quoting with backslash
/// escapes; a doubled quote simply closes and reopens the literal. Comments
/// are `# ...` and `-- ...` to end of line (the dashes must be followed by
/// whitespace) and `/* ... */`.
pub(crate) fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut state = Scan::Code;
    let mut chars = sql.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        state = match state {
            Scan::Quoted(q) if c == '\\' && q != '`' => Scan::Escaped(q),
            Scan::Quoted(q) if c == q => Scan::Code,
            Scan::Escaped(q) => Scan::Quoted(q),
            Scan::LineComment if c == '\n' => Scan::Code,
            Scan::BlockComment if c == '*' && chars.next_if(|&(_, n)| n == '/').is_some() => Scan::Code,
            Scan::Code => match c {
                '\'' | '"' | '`' => Scan::Quoted(c),
                '#' => Scan::LineComment,
                '-' if opens_line_comment(&sql[offset..]) => Scan::LineComment,
                '/' if chars.next_if(|&(_, n)| n == '*').is_some() => Scan::BlockComment,
                PLACEHOLDER => {
                    positions.push(offset);
                    Scan::Code
                }
                _ => Scan::Code,
            },
            other => other,
        };
    }
    positions
}

fn opens_line_comment(rest: &str) -> bool {
    rest.strip_prefix("--")
        .is_some_and(|after| after.chars().next().is_none_or(char::is_whitespace))
}

fn qualify(database: &str, table: &str) -> Result<String, StatementError> {
    validate_identifier(database)?;
    validate_identifier(table)?;
    Ok(format!("{database}.{table}"))
}

fn encode_for(column: &str, value: &Value) -> Result<Argument, StatementError> {
    Argument::encode(value).map_err(|source| StatementError::Argument {
        column: column.to_string(),
        source,
    })
}

/// Render `c1=?<sep>c2=?` and encode the values in the same order.
fn equalities<K: AsRef<str>>(
    pairs: &[(K, Value)],
    separator: &str,
) -> Result<(String, Arguments), StatementError> {
    let mut parts = Vec::with_capacity(pairs.len());
    let mut arguments = Arguments::new();
    for (column, value) in pairs {
        let column = column.as_ref();
        validate_identifier(column)?;
        parts.push(format!("{column}=?"));
        arguments = arguments.with(encode_for(column, value)?);
    }
    Ok((parts.join(separator), arguments))
}
