//! High-level SQL operations over a transport.
//!
//! [`Database`] composes a [`Signer`], a [`ChainConfig`] and a transport
//! implementing the collaborator traits. Every write builds one statement,
//! looks up account metadata once, signs and broadcasts exactly once. No
//! write is retried.

use glitter_core::address::Address;
use glitter_core::error::StatementError;
use glitter_core::result::{ResultRow, RowDecoder};
use glitter_core::statement::{self, validate_identifier, Statement};
use glitter_core::traits::{AccountInfoSource, Broadcaster, QueryService};
use glitter_core::types::{GrantRole, Msg, TxResult};
use glitter_core::value::Value;
use tracing::{debug, info};

use crate::builder::TransactionBuilder;
use crate::config::ChainConfig;
use crate::error::WalletError;
use crate::keys::{derive_with, Signer, GLITTER_COIN_TYPE};
use crate::mnemonic::Mnemonic;

/// A signing client bound to one account.
pub struct Database<T> {
    signer: Signer,
    config: ChainConfig,
    transport: T,
    decoder: RowDecoder,
}

impl<T> Database<T>
where
    T: AccountInfoSource + Broadcaster + QueryService,
{
    /// Fails if the config is invalid or the signer's address prefix does
    /// not match it.
    pub fn new(signer: Signer, config: ChainConfig, transport: T) -> Result<Self, WalletError> {
        config.validate()?;
        if signer.address().hrp() != config.hrp()? {
            return Err(WalletError::InvalidConfig(format!(
                "signer address {} does not use prefix {}",
                signer.address(),
                config.address_prefix
            )));
        }
        Ok(Self {
            signer,
            config,
            transport,
            decoder: RowDecoder::default(),
        })
    }

    /// Derive account `index` with the config's path policy and prefix.
    pub fn from_mnemonic(
        mnemonic: &Mnemonic,
        index: u32,
        config: ChainConfig,
        transport: T,
    ) -> Result<Self, WalletError> {
        let (signer, _) = derive_with(mnemonic, 0, index, GLITTER_COIN_TYPE, config.path_policy, config.hrp()?)?;
        Self::new(signer, config, transport)
    }

    /// Replace the decoder used by [`query`](Self::query).
    pub fn with_row_decoder(mut self, decoder: RowDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn address(&self) -> &Address {
        self.signer.address()
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign and broadcast an arbitrary statement.
    pub async fn sql_exec(&self, statement: Statement) -> Result<TxResult, WalletError> {
        let msg = Msg::sql_exec(self.address().to_string(), statement);
        self.submit(msg, None).await
    }

    /// Insert one row given as ordered column/value pairs.
    pub async fn insert<K: AsRef<str>>(
        &self,
        database: &str,
        table: &str,
        columns: &[(K, Value)],
    ) -> Result<TxResult, WalletError> {
        let names: Vec<&str> = columns.iter().map(|(k, _)| k.as_ref()).collect();
        let values: Vec<Value> = columns.iter().map(|(_, v)| v.clone()).collect();
        let stmt = statement::build_insert(&qualify(database, table), &names, values)?;
        self.sql_exec(stmt).await
    }

    /// Insert several rows in one statement.
    ///
    /// Column order is taken from the first row; every other row must carry
    /// exactly the same columns, in any order. A column named twice in one
    /// row, or absent from the first row, fails the whole batch.
    pub async fn batch_insert<K: AsRef<str>>(
        &self,
        database: &str,
        table: &str,
        rows: &[Vec<(K, Value)>],
    ) -> Result<TxResult, WalletError> {
        let first = rows
            .first()
            .ok_or_else(|| WalletError::BuildError("rows is empty".into()))?;
        let names: Vec<&str> = first.iter().map(|(k, _)| k.as_ref()).collect();

        let mut values = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(StatementError::ColumnCountMismatch {
                    row: index,
                    expected: names.len(),
                    got: row.len(),
                }
                .into());
            }
            let mut ordered: Vec<Option<Value>> = vec![None; names.len()];
            for (key, value) in row {
                let key = key.as_ref();
                let slot = names.iter().position(|name| *name == key).ok_or_else(|| {
                    StatementError::UnexpectedColumn {
                        row: index,
                        column: key.to_string(),
                    }
                })?;
                if ordered[slot].replace(value.clone()).is_some() {
                    return Err(StatementError::DuplicateColumn(key.to_string()).into());
                }
            }
            // Equal lengths and no repeated slot means every slot is filled.
            values.push(ordered.into_iter().flatten().collect());
        }

        let stmt = statement::build_batch_insert(&qualify(database, table), &names, &values)?;
        self.sql_exec(stmt).await
    }

    pub async fn update<K: AsRef<str>, W: AsRef<str>>(
        &self,
        database: &str,
        table: &str,
        columns: &[(K, Value)],
        conditions: &[(W, Value)],
    ) -> Result<TxResult, WalletError> {
        let stmt = statement::build_update(database, table, columns, conditions)?;
        self.sql_exec(stmt).await
    }

    pub async fn delete<W: AsRef<str>>(
        &self,
        database: &str,
        table: &str,
        conditions: &[(W, Value)],
        order_by: Option<&str>,
        ascending: bool,
        limit: u64,
    ) -> Result<TxResult, WalletError> {
        let stmt = statement::build_delete(database, table, conditions, order_by, ascending, limit)?;
        self.sql_exec(stmt).await
    }

    /// Run a read statement and decode the rows.
    pub async fn query(&self, statement: &Statement) -> Result<Vec<ResultRow>, WalletError> {
        let tagged = self.transport.query(statement).await?;
        debug!(rows = tagged.len(), statement_len = statement.sql().len(), "query returned");
        Ok(self.decoder.decode_rows(&tagged)?)
    }

    pub async fn grant_reader(&self, to: &Address, database: &str, table: Option<&str>) -> Result<TxResult, WalletError> {
        self.sql_grant(GrantRole::Reader, to, database, table).await
    }

    pub async fn grant_writer(&self, to: &Address, database: &str, table: Option<&str>) -> Result<TxResult, WalletError> {
        self.sql_grant(GrantRole::Writer, to, database, table).await
    }

    pub async fn grant_admin(&self, to: &Address, database: &str, table: Option<&str>) -> Result<TxResult, WalletError> {
        self.sql_grant(GrantRole::Admin, to, database, table).await
    }

    /// Grant `role` on `database`, or on one table of it.
    pub async fn sql_grant(
        &self,
        role: GrantRole,
        to: &Address,
        database: &str,
        table: Option<&str>,
    ) -> Result<TxResult, WalletError> {
        validate_identifier(database)?;
        if let Some(t) = table {
            validate_identifier(t)?;
        }
        let msg = Msg::SqlGrant {
            uid: self.address().to_string(),
            to_uid: to.to_string(),
            role,
            on_database: database.to_string(),
            on_table: table.map(str::to_string),
        };
        let memo = self.config.grant_memo.clone();
        self.submit(msg, Some(memo)).await
    }

    /// Send `amount` of the fee denomination to `to`.
    pub async fn transfer(&self, to: &Address, amount: u64) -> Result<TxResult, WalletError> {
        if amount == 0 {
            return Err(WalletError::BuildError("transfer amount must be positive".into()));
        }
        let msg = Msg::Send {
            from: self.address().to_string(),
            to: to.to_string(),
            amount,
            denom: self.config.fee_denom.clone(),
        };
        let memo = self.config.transfer_memo.clone();
        self.submit(msg, Some(memo)).await
    }

    async fn submit(&self, msg: Msg, memo: Option<String>) -> Result<TxResult, WalletError> {
        let mut builder = TransactionBuilder::new();
        builder.add_msg(msg);
        if let Some(m) = memo {
            builder.set_memo(m);
        }
        let unsigned = builder.build(&self.config, &self.signer, &self.transport).await?;
        let tx = TransactionBuilder::sign(unsigned, &self.signer)?;
        let tx_hash = tx.tx_hash()?;
        let result = self.transport.broadcast(&tx).await?;
        info!(address = %self.address(), sequence = tx.sequence, tx_hash = %tx_hash, "broadcast transaction");
        Ok(result)
    }
}

fn qualify(database: &str, table: &str) -> String {
    format!("{database}.{table}")
}
