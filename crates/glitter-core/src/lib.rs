//! # glitter-core
//! Foundation types for building and signing Glitter SQL transactions.
//!
//! - [`value`] — native scalar values bound into statements
//! - [`argument`] — tagged wire arguments and the ordered `Arguments` list
//! - [`statement`] — parameterized INSERT / UPDATE / DELETE builders
//! - [`escape`] — literal escaping for ad hoc SQL text
//! - [`result`] — decoding tagged query rows into native values
//! - [`crypto`] — secp256k1 recoverable signatures over Keccak-256 digests
//! - [`address`] — bech32 account addresses
//! - [`types`] — transaction messages, sign documents and signed envelopes
//! - [`traits`] — collaborator interfaces (account lookup, broadcast, query)

pub mod address;
pub mod argument;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod escape;
pub mod result;
pub mod statement;
pub mod traits;
pub mod types;
pub mod value;
