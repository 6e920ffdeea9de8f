//! Transaction builder with account metadata lookup and signing.
//!
//! Provides a builder pattern for constructing transactions:
//! 1. Add messages (SQL execution or grants) and optional overrides
//! 2. Build an unsigned transaction, fetching the account number and
//!    sequence once if either was not supplied
//! 3. Sign the sign document with the account's [`Signer`]
//!
//! Nothing is visible to the caller until signing succeeds. A failed lookup
//! or signature returns an error and leaves no partially built transaction.
//! Callers submitting concurrently from one account must allocate sequences
//! themselves; the builder never increments them.

use glitter_core::address::Address;
use glitter_core::error::TransactionError;
use glitter_core::statement::Statement;
use glitter_core::traits::AccountInfoSource;
use glitter_core::types::{AccountInfo, Msg, SignDoc, SignedTransaction, TxBody};
use tracing::debug;

use crate::config::ChainConfig;
use crate::error::WalletError;
use crate::keys::Signer;

/// A sign document ready for signing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub doc: SignDoc,
}

/// Builder for constructing and signing transactions.
///
/// # Example
/// ```ignore
/// let mut builder = TransactionBuilder::new();
/// builder.add_statement(signer.address(), statement);
/// let unsigned = builder.build(&config, &signer, &accounts).await?;
/// let signed = TransactionBuilder::sign(unsigned, &signer)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct TransactionBuilder {
    msgs: Vec<Msg>,
    memo: Option<String>,
    account_number: Option<u64>,
    sequence: Option<u64>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_msg(&mut self, msg: Msg) -> &mut Self {
        self.msgs.push(msg);
        self
    }

    /// Add a SQL execution message signed by `uid`.
    pub fn add_statement(&mut self, uid: &Address, statement: Statement) -> &mut Self {
        self.add_msg(Msg::sql_exec(uid.to_string(), statement))
    }

    /// Override the memo (default: the chain config's).
    pub fn set_memo(&mut self, memo: impl Into<String>) -> &mut Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn set_account_number(&mut self, account_number: u64) -> &mut Self {
        self.account_number = Some(account_number);
        self
    }

    pub fn set_sequence(&mut self, sequence: u64) -> &mut Self {
        self.sequence = Some(sequence);
        self
    }

    /// Build the sign document.
    ///
    /// Every message must name `signer` as its sender. If the account
    /// number or the sequence is missing, both are looked up once from
    /// `accounts` under the config's deadline; supplied values win over
    /// fetched ones.
    pub async fn build(
        &self,
        config: &ChainConfig,
        signer: &Signer,
        accounts: &dyn AccountInfoSource,
    ) -> Result<UnsignedTransaction, WalletError> {
        if self.msgs.is_empty() {
            return Err(WalletError::BuildError("no messages".into()));
        }
        let sender = signer.address().to_string();
        if let Some(foreign) = self.msgs.iter().find(|m| m.signer() != sender) {
            return Err(WalletError::BuildError(format!(
                "message signer {} is not {sender}",
                foreign.signer()
            )));
        }

        let (account_number, sequence) = match (self.account_number, self.sequence) {
            (Some(a), Some(s)) => (a, s),
            (a, s) => {
                let fetched = fetch_account_info(config, accounts, signer.address()).await?;
                (a.unwrap_or(fetched.account_number), s.unwrap_or(fetched.sequence))
            }
        };

        let doc = SignDoc {
            chain_id: config.chain_id.clone(),
            account_number,
            sequence,
            body: TxBody {
                msgs: self.msgs.clone(),
                memo: self.memo.clone().unwrap_or_else(|| config.memo.clone()),
            },
            fee: config.fee(),
            public_key: signer.public_key().to_compressed().to_vec(),
        };
        Ok(UnsignedTransaction { doc })
    }

    /// Sign an unsigned transaction.
    ///
    /// Fails if the document names a different public key than the signer's.
    pub fn sign(unsigned: UnsignedTransaction, signer: &Signer) -> Result<SignedTransaction, WalletError> {
        let doc = unsigned.doc;
        if doc.public_key != signer.public_key().to_compressed() {
            return Err(TransactionError::SignerMismatch.into());
        }
        let bytes = doc.to_bytes()?;
        let signature = signer.sign(&bytes)?;
        debug!(
            address = %signer.address(),
            account_number = doc.account_number,
            sequence = doc.sequence,
            msgs = doc.body.msgs.len(),
            "signed transaction"
        );
        Ok(SignedTransaction::new(doc, signature))
    }
}

/// Look up account metadata under the config's deadline.
pub async fn fetch_account_info(
    config: &ChainConfig,
    accounts: &dyn AccountInfoSource,
    address: &Address,
) -> Result<AccountInfo, WalletError> {
    let deadline = config.account_fetch_timeout();
    let info = tokio::time::timeout(deadline, accounts.account_info(address))
        .await
        .map_err(|_| WalletError::AccountFetchTimeout {
            timeout_ms: config.account_fetch_timeout_ms,
        })??;
    debug!(address = %address, account_number = info.account_number, sequence = info.sequence, "fetched account info");
    Ok(info)
}

/// Wrap `statement` in a single-message transaction and sign it.
///
/// `account_number` and `sequence` are fetched when either is `None`.
pub async fn assemble_and_sign(
    config: &ChainConfig,
    accounts: &dyn AccountInfoSource,
    signer: &Signer,
    statement: Statement,
    account_number: Option<u64>,
    sequence: Option<u64>,
) -> Result<SignedTransaction, WalletError> {
    let mut builder = TransactionBuilder::new();
    builder.add_statement(signer.address(), statement);
    if let Some(a) = account_number {
        builder.set_account_number(a);
    }
    if let Some(s) = sequence {
        builder.set_sequence(s);
    }
    let unsigned = builder.build(config, signer, accounts).await?;
    TransactionBuilder::sign(unsigned, signer)
}
