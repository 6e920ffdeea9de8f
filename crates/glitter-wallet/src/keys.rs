//! HD paths and signer derivation.
//!
//! Keys follow BIP-32 over secp256k1 from a BIP-39 seed with an empty
//! passphrase. Accounts deployed so far all live in one fixed account tree,
//! `m/44'/60'/0'/0/{index}`: the hardened account and coin segments stay
//! constant and only the index varies. [`PathPolicy::FixedAccountTree`]
//! reproduces those addresses and is the default. [`PathPolicy::FollowPath`]
//! honours the caller's account and coin type instead.

use bip32::{DerivationPath, XPrv};
use glitter_core::address::{parse_hrp, Address, Hrp};
use glitter_core::constants::DEFAULT_ADDRESS_HRP;
use glitter_core::crypto::{PublicKey, RecoverableSignature, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::mnemonic::Mnemonic;

/// SLIP-44 coin type of the fixed account tree.
pub const GLITTER_COIN_TYPE: u32 = 60;

/// BIP-44 purpose segment.
pub const BIP44_PURPOSE: u32 = 44;

/// First hardened child number; segment values must stay below it.
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// A BIP-44 path `m/44'/coin_type'/account'/0/index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HdPath {
    coin_type: u32,
    account: u32,
    index: u32,
}

impl HdPath {
    pub fn new(coin_type: u32, account: u32, index: u32) -> Result<Self, WalletError> {
        for (name, value) in [("coin_type", coin_type), ("account", account), ("index", index)] {
            if value >= HARDENED_OFFSET {
                return Err(WalletError::InvalidDerivationPath(format!(
                    "{name} {value} is not below 2^31"
                )));
            }
        }
        Ok(Self { coin_type, account, index })
    }

    /// `m/44'/60'/0'/0/{index}`.
    pub fn fixed_account(index: u32) -> Result<Self, WalletError> {
        Self::new(GLITTER_COIN_TYPE, 0, index)
    }

    pub fn coin_type(&self) -> u32 {
        self.coin_type
    }

    pub fn account(&self) -> u32 {
        self.account
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    fn to_derivation_path(self) -> Result<DerivationPath, WalletError> {
        self.to_string()
            .parse()
            .map_err(|e: bip32::Error| WalletError::InvalidDerivationPath(e.to_string()))
    }
}

impl fmt::Display for HdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{BIP44_PURPOSE}'/{}'/{}'/0/{}",
            self.coin_type, self.account, self.index
        )
    }
}

/// How the caller's `account` and `coin_type` map onto the HD path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPolicy {
    /// Always `m/44'/60'/0'/0/{index}`; account and coin type are ignored.
    #[default]
    FixedAccountTree,
    /// `m/44'/{coin_type}'/{account}'/0/{index}`.
    FollowPath,
}

impl PathPolicy {
    pub fn resolve(self, account: u32, index: u32, coin_type: u32) -> Result<HdPath, WalletError> {
        match self {
            PathPolicy::FixedAccountTree => {
                if account != 0 || coin_type != GLITTER_COIN_TYPE {
                    warn!(account, coin_type, index, "fixed account tree ignores account and coin type");
                }
                HdPath::fixed_account(index)
            }
            PathPolicy::FollowPath => HdPath::new(coin_type, account, index),
        }
    }
}

/// Signing capability for one derived account.
///
/// Exposes signing and the public identity only; the secret scalar never
/// leaves this type.
pub struct Signer {
    secret: SecretKey,
    public_key: PublicKey,
    address: Address,
    path: Option<HdPath>,
}

impl Signer {
    /// Derive the signer at `path` from `mnemonic`.
    pub fn from_mnemonic(mnemonic: &Mnemonic, path: HdPath, hrp: Hrp) -> Result<Self, WalletError> {
        let seed = mnemonic.to_seed()?;
        let xprv = XPrv::derive_from_path(&seed[..], &path.to_derivation_path()?)
            .map_err(|e| WalletError::InvalidDerivationPath(e.to_string()))?;
        let secret_bytes = Zeroizing::new(xprv.to_bytes());
        let mut signer = Self::from_secret_bytes(&secret_bytes[..], hrp)?;
        signer.path = Some(path);
        debug!(path = %path, address = %signer.address, "derived signer");
        Ok(signer)
    }

    /// Wrap a raw 32-byte private key.
    pub fn from_secret_bytes(bytes: &[u8], hrp: Hrp) -> Result<Self, WalletError> {
        let secret = SecretKey::from_bytes(bytes)?;
        let public_key = secret.public_key();
        Ok(Self {
            address: Address::from_public_key(&public_key, hrp),
            public_key,
            secret,
            path: None,
        })
    }

    /// Keccak-256 `message` and sign it.
    pub fn sign(&self, message: &[u8]) -> Result<RecoverableSignature, WalletError> {
        Ok(self.secret.sign(message)?)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Path the signer was derived at, if it came from a mnemonic.
    pub fn hd_path(&self) -> Option<HdPath> {
        self.path
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Derive the signer and address for `index` under the default policy and
/// the `glitter` prefix.
pub fn derive(
    mnemonic: &Mnemonic,
    account: u32,
    index: u32,
    coin_type: u32,
) -> Result<(Signer, Address), WalletError> {
    derive_with(
        mnemonic,
        account,
        index,
        coin_type,
        PathPolicy::default(),
        parse_hrp(DEFAULT_ADDRESS_HRP)?,
    )
}

/// [`derive`] with an explicit path policy and address prefix.
pub fn derive_with(
    mnemonic: &Mnemonic,
    account: u32,
    index: u32,
    coin_type: u32,
    policy: PathPolicy,
    hrp: Hrp,
) -> Result<(Signer, Address), WalletError> {
    let path = policy.resolve(account, index, coin_type)?;
    let signer = Signer::from_mnemonic(mnemonic, path, hrp)?;
    let address = *signer.address();
    Ok((signer, address))
}
