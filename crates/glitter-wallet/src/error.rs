//! Wallet error types.

use glitter_core::error::{
    AddressError, CodecError, CoreError, CryptoError, StatementError, TransactionError, TransportError,
};
use thiserror::Error;

/// Errors that can occur in key handling, assembly and database operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The phrase failed BIP-39 wordlist or checksum validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// A path segment is out of range or the path could not be derived.
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    /// A chain configuration field failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The transaction could not be assembled from the supplied parts.
    #[error("build error: {0}")]
    BuildError(String),

    /// The account metadata lookup did not answer within the deadline.
    #[error("account lookup timed out after {timeout_ms} ms")]
    AccountFetchTimeout {
        /// Deadline that expired, in milliseconds.
        timeout_ms: u64,
    },

    /// Invalid address string or prefix.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// Signing, recovery or key parsing failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Statement construction failure.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// Argument or result decoding failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transaction encoding or verification failure.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Failure reported by a transport collaborator, passed through as is.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Any other core failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}
