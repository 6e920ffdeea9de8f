//! Collaborator interfaces.
//!
//! The core performs no network I/O of its own. Transports implement these
//! traits:
//! - [`AccountInfoSource`] — account number and sequence lookup
//! - [`Broadcaster`] — submission of signed transactions
//! - [`QueryService`] — execution of read statements, returning tagged rows
//!
//! None of the core callers retry; retry and backoff belong to the
//! implementation.

use async_trait::async_trait;

use crate::address::Address;
use crate::error::TransportError;
use crate::result::TaggedRow;
use crate::statement::Statement;
use crate::types::{AccountInfo, SignedTransaction, TxResult};

/// Ledger account metadata lookup.
#[async_trait]
pub trait AccountInfoSource: Send + Sync {
    /// Current account number and sequence of `address`.
    ///
    /// Fails if the address is unknown or the service is unreachable.
    async fn account_info(&self, address: &Address) -> Result<AccountInfo, TransportError>;
}

/// Submission of signed transactions.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Submit `tx`. The returned body is passed through to the caller
    /// unchanged.
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxResult, TransportError>;
}

/// Read-only statement execution.
#[async_trait]
pub trait QueryService: Send + Sync {
    async fn query(&self, statement: &Statement) -> Result<Vec<TaggedRow>, TransportError>;
}
