//! Shared test helpers for property and end-to-end tests.

use async_trait::async_trait;
use glitter_core::address::{parse_hrp, Address, Hrp};
use glitter_core::constants::DEFAULT_ADDRESS_HRP;
use glitter_core::error::TransportError;
use glitter_core::result::TaggedRow;
use glitter_core::statement::Statement;
use glitter_core::traits::{AccountInfoSource, Broadcaster, QueryService};
use glitter_core::types::{AccountInfo, SignedTransaction, TxResult};
use glitter_wallet::Mnemonic;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Public Hardhat/Anvil development phrase.
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// `m/44'/60'/0'/0/0` of [`DEV_MNEMONIC`].
pub const DEV_ADDRESS: &str = "glitter17w0adeg64ky0daxwd2ugyuneellmjgnx359muv";
pub const DEV_ADDRESS_HEX: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// `m/44'/60'/0'/0/1` of [`DEV_MNEMONIC`].
pub const DEV_ADDRESS_1: &str = "glitter1wzvhjux9rqfdcwspp37srdgwp5tac7wgelpyg2";

pub const CHAIN_ID: &str = "glitter_12000-2";

pub fn dev_mnemonic() -> Mnemonic {
    Mnemonic::parse(DEV_MNEMONIC).expect("dev mnemonic is valid")
}

pub fn glitter_hrp() -> Hrp {
    parse_hrp(DEFAULT_ADDRESS_HRP).expect("default prefix is valid")
}

/// In-memory chain implementing every collaborator trait.
///
/// Tracks one account: the sequence advances on each accepted broadcast.
/// Failure flags make the next lookup or broadcast return a transport
/// error instead.
pub struct MockLedger {
    account_number: u64,
    sequence: Mutex<u64>,
    rows: Mutex<Vec<TaggedRow>>,
    broadcasts: Mutex<Vec<SignedTransaction>>,
    queries: Mutex<Vec<Statement>>,
    account_lookups: AtomicUsize,
    fail_lookup: AtomicBool,
    fail_broadcast: AtomicBool,
}

impl MockLedger {
    pub fn new(account_number: u64, sequence: u64) -> Self {
        Self {
            account_number,
            sequence: Mutex::new(sequence),
            rows: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            account_lookups: AtomicUsize::new(0),
            fail_lookup: AtomicBool::new(false),
            fail_broadcast: AtomicBool::new(false),
        }
    }

    /// Rows returned by every subsequent query.
    pub fn set_rows(&self, rows: Vec<TaggedRow>) {
        *self.rows.lock() = rows;
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn fail_broadcasts(&self, fail: bool) {
        self.fail_broadcast.store(fail, Ordering::SeqCst);
    }

    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.broadcasts.lock().clone()
    }

    pub fn queries(&self) -> Vec<Statement> {
        self.queries.lock().clone()
    }

    pub fn account_lookups(&self) -> usize {
        self.account_lookups.load(Ordering::SeqCst)
    }

    pub fn sequence(&self) -> u64 {
        *self.sequence.lock()
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

#[async_trait]
impl AccountInfoSource for MockLedger {
    async fn account_info(&self, _address: &Address) -> Result<AccountInfo, TransportError> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(TransportError::new(Some(503), "account service unavailable"));
        }
        Ok(AccountInfo {
            account_number: self.account_number,
            sequence: *self.sequence.lock(),
        })
    }
}

#[async_trait]
impl Broadcaster for MockLedger {
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxResult, TransportError> {
        if self.fail_broadcast.load(Ordering::SeqCst) {
            return Err(TransportError::new(Some(500), "broadcast rejected"));
        }
        let mut sequence = self.sequence.lock();
        if tx.sequence != *sequence {
            return Err(TransportError::new(
                Some(400),
                format!("account sequence mismatch, expected {}, got {}", *sequence, tx.sequence),
            ));
        }
        *sequence += 1;
        let tx_hash = tx
            .tx_hash()
            .map_err(|e| TransportError::new(Some(400), e.to_string()))?;
        self.broadcasts.lock().push(tx.clone());
        Ok(serde_json::json!({ "code": 0, "txhash": tx_hash }))
    }
}

#[async_trait]
impl QueryService for MockLedger {
    async fn query(&self, statement: &Statement) -> Result<Vec<TaggedRow>, TransportError> {
        self.queries.lock().push(statement.clone());
        Ok(self.rows.lock().clone())
    }
}
