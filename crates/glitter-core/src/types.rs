//! Transaction messages, sign documents and signed envelopes.
//!
//! A transaction carries one or more [`Msg`]s. The signer commits to a
//! [`SignDoc`] (body, fee, chain id, account number, sequence and public
//! key) encoded with bincode's standard configuration. The Keccak-256 digest
//! of those bytes is what gets signed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{SEND_TYPE_URL, SQL_EXEC_TYPE_URL, SQL_GRANT_TYPE_URL};
use crate::crypto::{keccak256, PublicKey, RecoverableSignature};
use crate::error::{CryptoError, TransactionError};
use crate::statement::Statement;

/// Result body returned by a broadcast. Passed through uninterpreted.
pub type TxResult = serde_json::Value;

/// Access level granted on a database or table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum GrantRole {
    Reader,
    Writer,
    Admin,
}

impl GrantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantRole::Reader => "reader",
            GrantRole::Writer => "writer",
            GrantRole::Admin => "admin",
        }
    }
}

impl fmt::Display for GrantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction message.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    /// Execute a parameterized statement as `uid`.
    SqlExec {
        uid: String,
        sql: String,
        arguments: crate::argument::Arguments,
    },
    /// Grant `role` on a database, or on one table of it, to `to_uid`.
    SqlGrant {
        uid: String,
        to_uid: String,
        role: GrantRole,
        on_database: String,
        on_table: Option<String>,
    },
    /// Move `amount` of `denom` from `from` to `to`.
    Send {
        from: String,
        to: String,
        amount: u64,
        denom: String,
    },
}

impl Msg {
    pub fn sql_exec(uid: impl Into<String>, statement: Statement) -> Self {
        let (sql, arguments) = statement.into_parts();
        Msg::SqlExec {
            uid: uid.into(),
            sql,
            arguments,
        }
    }

    pub fn type_url(&self) -> &'static str {
        match self {
            Msg::SqlExec { .. } => SQL_EXEC_TYPE_URL,
            Msg::SqlGrant { .. } => SQL_GRANT_TYPE_URL,
            Msg::Send { .. } => SEND_TYPE_URL,
        }
    }

    /// Address of the account that must sign this message.
    pub fn signer(&self) -> &str {
        match self {
            Msg::SqlExec { uid, .. } | Msg::SqlGrant { uid, .. } => uid,
            Msg::Send { from, .. } => from,
        }
    }
}

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct TxBody {
    pub msgs: Vec<Msg>,
    pub memo: String,
}

#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct Fee {
    pub denom: String,
    pub gas_limit: u64,
}

/// Ledger counters for an account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Everything the signature commits to.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct SignDoc {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub body: TxBody,
    pub fee: Fee,
    /// SEC1-compressed public key of the signer.
    pub public_key: Vec<u8>,
}

impl SignDoc {
    /// Canonical bytes to sign.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        if self.body.msgs.is_empty() {
            return Err(TransactionError::NoMessages);
        }
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }
}

/// A signed, broadcast-ready transaction.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct SignedTransaction {
    pub body: TxBody,
    pub fee: Fee,
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub public_key: Vec<u8>,
    /// `r || s || v`, 65 bytes.
    pub signature: Vec<u8>,
}

impl SignedTransaction {
    /// Attach a signature to the document it was produced over.
    pub fn new(doc: SignDoc, signature: RecoverableSignature) -> Self {
        Self {
            body: doc.body,
            fee: doc.fee,
            chain_id: doc.chain_id,
            account_number: doc.account_number,
            sequence: doc.sequence,
            public_key: doc.public_key,
            signature: signature.to_vec(),
        }
    }

    /// Rebuild the document the signature covers.
    pub fn sign_doc(&self) -> SignDoc {
        SignDoc {
            chain_id: self.chain_id.clone(),
            account_number: self.account_number,
            sequence: self.sequence,
            body: self.body.clone(),
            fee: self.fee.clone(),
            public_key: self.public_key.clone(),
        }
    }

    pub fn sign_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        self.sign_doc().to_bytes()
    }

    pub fn signer_public_key(&self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_sec1_bytes(&self.public_key)
    }

    pub fn recoverable_signature(&self) -> Result<RecoverableSignature, CryptoError> {
        RecoverableSignature::from_bytes(&self.signature)
    }

    /// Recover the signer from the signature and check it against the
    /// embedded public key.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let digest = keccak256(&self.sign_bytes()?);
        let recovered = self.recoverable_signature()?.recover_digest(&digest)?;
        if recovered != self.signer_public_key()? {
            return Err(TransactionError::SignerMismatch);
        }
        Ok(())
    }

    /// Base64 of the bincode-encoded transaction.
    pub fn to_wire(&self) -> Result<String, TransactionError> {
        Ok(BASE64.encode(self.wire_bytes()?))
    }

    pub fn from_wire(s: &str) -> Result<Self, TransactionError> {
        let raw = BASE64
            .decode(s.as_bytes())
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        let (tx, _) = bincode::decode_from_slice(&raw, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(tx)
    }

    /// Keccak-256 of the wire bytes, hex encoded.
    pub fn tx_hash(&self) -> Result<String, TransactionError> {
        Ok(hex::encode(keccak256(&self.wire_bytes()?)))
    }

    fn wire_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Arguments;
    use crate::crypto::SecretKey;
    use crate::value::Value;

    fn key(byte: u8) -> SecretKey {
        SecretKey::from_bytes(&[byte; 32]).unwrap()
    }

    fn doc(key: &SecretKey) -> SignDoc {
        let args = Arguments::from_values(&[Value::from("a")]).unwrap();
        let stmt = Statement::new("INSERT INTO db.t (id) VALUES (?)", args).unwrap();
        SignDoc {
            chain_id: "glitter_12000-2".into(),
            account_number: 4,
            sequence: 9,
            body: TxBody {
                msgs: vec![Msg::sql_exec("glitter1xyz", stmt)],
                memo: "sql transaction!".into(),
            },
            fee: Fee { denom: "agli".into(), gas_limit: 200_000 },
            public_key: key.public_key().to_compressed().to_vec(),
        }
    }

    fn signed(key: &SecretKey) -> SignedTransaction {
        let doc = doc(key);
        let sig = key.sign(&doc.to_bytes().unwrap()).unwrap();
        SignedTransaction::new(doc, sig)
    }

    #[test]
    fn empty_body_cannot_be_signed() {
        let mut d = doc(&key(1));
        d.body.msgs.clear();
        assert_eq!(d.to_bytes(), Err(TransactionError::NoMessages));
    }

    #[test]
    fn sign_bytes_match_doc() {
        let k = key(1);
        let tx = signed(&k);
        assert_eq!(tx.sign_bytes().unwrap(), doc(&k).to_bytes().unwrap());
    }

    #[test]
    fn verify_accepts_genuine_signature() {
        assert!(signed(&key(1)).verify().is_ok());
    }

    #[test]
    fn verify_rejects_tampered_sequence() {
        let mut tx = signed(&key(1));
        tx.sequence += 1;
        assert_eq!(tx.verify(), Err(TransactionError::SignerMismatch));
    }

    #[test]
    fn verify_rejects_foreign_public_key() {
        let mut tx = signed(&key(1));
        tx.public_key = key(2).public_key().to_compressed().to_vec();
        assert_eq!(tx.verify(), Err(TransactionError::SignerMismatch));
    }

    #[test]
    fn verify_rejects_truncated_signature() {
        let mut tx = signed(&key(1));
        tx.signature.truncate(64);
        assert_eq!(tx.verify(), Err(TransactionError::Crypto(CryptoError::InvalidSignature)));
    }

    #[test]
    fn wire_form_decodes_back() {
        let tx = signed(&key(3));
        let wire = tx.to_wire().unwrap();
        assert_eq!(SignedTransaction::from_wire(&wire).unwrap(), tx);
        assert!(SignedTransaction::from_wire("not base64!").is_err());
        assert_eq!(tx.tx_hash().unwrap().len(), 64);
    }

    #[test]
    fn msg_metadata() {
        let grant = Msg::SqlGrant {
            uid: "glitter1admin".into(),
            to_uid: "glitter1reader".into(),
            role: GrantRole::Reader,
            on_database: "library".into(),
            on_table: None,
        };
        assert_eq!(grant.type_url(), SQL_GRANT_TYPE_URL);
        assert_eq!(grant.signer(), "glitter1admin");
        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["type"], "sql_grant");
        assert_eq!(json["role"], "reader");
    }

    #[test]
    fn send_is_signed_by_sender() {
        let send = Msg::Send {
            from: "glitter1alice".into(),
            to: "glitter1bob".into(),
            amount: 1_000,
            denom: "agli".into(),
        };
        assert_eq!(send.type_url(), SEND_TYPE_URL);
        assert_eq!(send.signer(), "glitter1alice");
        let json = serde_json::to_value(&send).unwrap();
        assert_eq!(json["type"], "send");
        assert_eq!(json["amount"], 1_000);
    }
}
