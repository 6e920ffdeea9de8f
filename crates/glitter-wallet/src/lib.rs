//! # glitter-wallet — keys, signing and transaction assembly for Glitter.
//!
//! Derives secp256k1 signers from BIP-39 mnemonics, assembles SQL messages
//! into signed transactions and wraps the whole flow in a [`Database`]
//! facade over caller-supplied transports.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`mnemonic`] — BIP-39 phrase generation and parsing
//! - [`keys`] — HD paths and the `Signer` capability
//! - [`config`] — per-chain configuration
//! - [`builder`] — transaction builder with account metadata lookup
//! - [`database`] — high-level SQL operations

pub mod builder;
pub mod config;
pub mod database;
pub mod error;
pub mod keys;
pub mod mnemonic;

pub use builder::{assemble_and_sign, TransactionBuilder, UnsignedTransaction};
pub use config::ChainConfig;
pub use database::Database;
pub use error::WalletError;
pub use keys::{derive, derive_with, HdPath, PathPolicy, Signer};
pub use mnemonic::Mnemonic;
