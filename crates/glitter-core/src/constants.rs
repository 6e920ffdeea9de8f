//! Protocol and statement constants.

/// Maximum number of rows a single DELETE statement may touch.
///
/// Matches the write-limit of the public deployment profile. Builders refuse
/// larger limits rather than clamping them.
pub const MAX_DELETE_ROWS: u64 = 50;

/// Positional placeholder marker in statement text.
pub const PLACEHOLDER: char = '?';

/// Wire encoding of `true` in BOOL arguments.
pub const BOOL_TRUE: &str = "True";

/// Wire encoding of `false` in BOOL arguments.
pub const BOOL_FALSE: &str = "False";

/// Default bech32 human-readable prefix for account addresses.
pub const DEFAULT_ADDRESS_HRP: &str = "glitter";

/// Number of address bytes taken from the tail of the public key hash.
pub const ADDRESS_LEN: usize = 20;

/// Length of a recoverable signature: `r || s || recovery_id`.
pub const SIGNATURE_LEN: usize = 65;

/// Length of a SEC1-compressed secp256k1 public key.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

/// Length of a SEC1-uncompressed secp256k1 public key.
pub const UNCOMPRESSED_PUBKEY_LEN: usize = 65;

/// Type URL of the SQL execution message.
pub const SQL_EXEC_TYPE_URL: &str = "/blockved.glitterchain.index.SQLExecRequest";

/// Type URL of the SQL grant message.
pub const SQL_GRANT_TYPE_URL: &str = "/blockved.glitterchain.index.SQLGrantRequest";

/// Type URL of the token transfer message.
pub const SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
