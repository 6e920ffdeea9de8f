//! Error types for Glitter statement building, decoding and signing.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unsupported argument type: {0}")] UnsupportedArgumentType(String),
    #[error("decode error ({context}): {reason}")] Decode { context: String, reason: String },
}

impl CodecError {
    pub(crate) fn decode(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode { context: context.into(), reason: reason.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("column count mismatch in row {row}: expected {expected}, got {got}")] ColumnCountMismatch { row: usize, expected: usize, got: usize },
    #[error("empty column set")] EmptyColumnSet,
    #[error("empty where clause on {table}: refusing to touch every row")] EmptyWhereClause { table: String },
    #[error("limit exceeded: {limit} > {max}")] LimitExceeded { limit: u64, max: u64 },
    #[error("no rows to insert")] EmptyRows,
    #[error("placeholder mismatch: {placeholders} placeholders, {arguments} arguments")] PlaceholderMismatch { placeholders: usize, arguments: usize },
    #[error("invalid identifier: {0:?}")] InvalidIdentifier(String),
    #[error("duplicate column: {0}")] DuplicateColumn(String),
    #[error("row {row} has column {column} missing from the first row")] UnexpectedColumn { row: usize, column: String },
    #[error("argument for column {column}: {source}")] Argument { column: String, source: CodecError },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("signing error: {0}")] SigningError(String),
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("public key recovery failed")] RecoveryFailed,
    #[error("signature verification failed")] VerificationFailed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid HRP: {0:?}")] InvalidHrp(String),
    #[error("unexpected HRP: expected {expected}, got {got}")] UnexpectedHrp { expected: String, got: String },
    #[error("invalid length: expected {expected} bytes, got {got}")] InvalidLength { expected: usize, got: usize },
    #[error("bech32: {0}")] Bech32(String),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction has no messages")] NoMessages,
    #[error("serialization: {0}")] Serialization(String),
    #[error("signature does not match the embedded public key")] SignerMismatch,
    #[error(transparent)] Crypto(#[from] CryptoError),
}

/// Failure reported by an external collaborator (account lookup, broadcast, query).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error (status {}): {message}", status_label(.status))]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

impl TransportError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)] Codec(#[from] CodecError),
    #[error(transparent)] Statement(#[from] StatementError),
    #[error(transparent)] Crypto(#[from] CryptoError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Transaction(#[from] TransactionError),
    #[error(transparent)] Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_column_count_mismatch() {
        let e = StatementError::ColumnCountMismatch { row: 1, expected: 2, got: 3 };
        assert_eq!(e.to_string(), "column count mismatch in row 1: expected 2, got 3");
    }

    #[test]
    fn display_limit_exceeded() {
        let e = StatementError::LimitExceeded { limit: 51, max: 50 };
        assert_eq!(e.to_string(), "limit exceeded: 51 > 50");
    }

    #[test]
    fn display_argument_names_column() {
        let e = StatementError::Argument {
            column: "price".into(),
            source: CodecError::UnsupportedArgumentType("NULL".into()),
        };
        assert_eq!(e.to_string(), "argument for column price: unsupported argument type: NULL");
    }

    #[test]
    fn display_transport_with_and_without_status() {
        let e = TransportError::new(Some(404), "account not found");
        assert_eq!(e.to_string(), "transport error (status 404): account not found");
        let e = TransportError::new(None, "connection refused");
        assert_eq!(e.to_string(), "transport error (status none): connection refused");
    }

    #[test]
    fn from_crypto_error() {
        let tx: TransactionError = CryptoError::InvalidSignature.into();
        assert_eq!(tx, TransactionError::Crypto(CryptoError::InvalidSignature));
    }

    #[test]
    fn core_error_is_transparent() {
        let e: CoreError = StatementError::EmptyColumnSet.into();
        assert_eq!(e.to_string(), "empty column set");
        assert!(matches!(e, CoreError::Statement(StatementError::EmptyColumnSet)));
    }
}
