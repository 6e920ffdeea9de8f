//! Per-chain configuration passed into transaction assembly.

use glitter_core::address::{parse_hrp, Hrp};
use glitter_core::constants::DEFAULT_ADDRESS_HRP;
use glitter_core::types::Fee;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::WalletError;
use crate::keys::PathPolicy;

/// Memo attached to SQL execution transactions.
pub const DEFAULT_MEMO: &str = "sql transaction!";

/// Memo attached to grant transactions.
pub const DEFAULT_GRANT_MEMO: &str = "grant transaction!";

/// Memo attached to token transfers.
pub const DEFAULT_TRANSFER_MEMO: &str = "ban send transaction!";

/// Fee denomination of the native token.
pub const DEFAULT_FEE_DENOM: &str = "agli";

/// Account lookup deadline.
pub const DEFAULT_ACCOUNT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Chain parameters for signing and broadcasting.
///
/// Deserializes from JSON or TOML with every field except `chain_id`
/// optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub chain_id: String,
    /// Bech32 prefix of account addresses.
    pub address_prefix: String,
    pub memo: String,
    pub grant_memo: String,
    pub transfer_memo: String,
    /// Denomination of fees and of transferred amounts.
    pub fee_denom: String,
    /// Zero lets the service estimate gas.
    pub gas_limit: u64,
    pub account_fetch_timeout_ms: u64,
    pub path_policy: PathPolicy,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: String::new(),
            address_prefix: DEFAULT_ADDRESS_HRP.to_string(),
            memo: DEFAULT_MEMO.to_string(),
            grant_memo: DEFAULT_GRANT_MEMO.to_string(),
            transfer_memo: DEFAULT_TRANSFER_MEMO.to_string(),
            fee_denom: DEFAULT_FEE_DENOM.to_string(),
            gas_limit: 0,
            account_fetch_timeout_ms: DEFAULT_ACCOUNT_FETCH_TIMEOUT_MS,
            path_policy: PathPolicy::default(),
        }
    }
}

impl ChainConfig {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            ..Self::default()
        }
    }

    /// Reject an empty chain id, an invalid prefix, an empty fee denom or a
    /// zero timeout.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.chain_id.trim().is_empty() {
            return Err(WalletError::InvalidConfig("chain_id is empty".into()));
        }
        parse_hrp(&self.address_prefix)
            .map_err(|e| WalletError::InvalidConfig(format!("address_prefix: {e}")))?;
        if self.fee_denom.is_empty() {
            return Err(WalletError::InvalidConfig("fee_denom is empty".into()));
        }
        if self.account_fetch_timeout_ms == 0 {
            return Err(WalletError::InvalidConfig("account_fetch_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn hrp(&self) -> Result<Hrp, WalletError> {
        Ok(parse_hrp(&self.address_prefix)?)
    }

    pub fn account_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.account_fetch_timeout_ms)
    }

    pub fn fee(&self) -> Fee {
        Fee {
            denom: self.fee_denom.clone(),
            gas_limit: self.gas_limit,
        }
    }
}
