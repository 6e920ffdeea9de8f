//! Bech32 account addresses.
//!
//! An address is the 20-byte Keccak-256 tail of the uncompressed public key
//! (the Ethereum address of the same key), rendered with bech32 under a
//! chain prefix: `glitter1...`, 46 characters. The same bytes can also be
//! shown in `0x`-prefixed hex form.

use bech32::Bech32;
pub use bech32::Hrp;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{ADDRESS_LEN, DEFAULT_ADDRESS_HRP};
use crate::crypto::PublicKey;
use crate::error::AddressError;

/// Validate a human-readable prefix.
pub fn parse_hrp(prefix: &str) -> Result<Hrp, AddressError> {
    Hrp::parse(prefix).map_err(|_| AddressError::InvalidHrp(prefix.to_string()))
}

/// A chain account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    hrp: Hrp,
    bytes: [u8; ADDRESS_LEN],
}

impl Address {
    pub fn new(hrp: Hrp, bytes: [u8; ADDRESS_LEN]) -> Self {
        Self { hrp, bytes }
    }

    /// Address of `public_key` under `hrp`.
    pub fn from_public_key(public_key: &PublicKey, hrp: Hrp) -> Self {
        Self::new(hrp, public_key.address_bytes())
    }

    /// Parse the hex form, with or without `0x`.
    pub fn from_hex(s: &str, hrp: Hrp) -> Result<Self, AddressError> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let raw = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self::new(hrp, to_array(&raw)?))
    }

    /// Decode a bech32 address under any prefix.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;
        Ok(Self::new(hrp, to_array(&data)?))
    }

    /// Decode a bech32 address and require the given prefix.
    pub fn decode_with_hrp(s: &str, expected: &str) -> Result<Self, AddressError> {
        let address = Self::decode(s)?;
        if !address.hrp.as_str().eq_ignore_ascii_case(expected) {
            return Err(AddressError::UnexpectedHrp {
                expected: expected.to_string(),
                got: address.hrp.to_lowercase(),
            });
        }
        Ok(address)
    }

    /// Bech32 form.
    pub fn encode(&self) -> Result<String, AddressError> {
        bech32::encode::<Bech32>(self.hrp, &self.bytes).map_err(|e| AddressError::Bech32(e.to_string()))
    }

    /// `0x`-prefixed lower-case hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    pub fn hrp(&self) -> Hrp {
        self.hrp
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.bytes
    }

    /// Whether the prefix is the default `glitter` prefix.
    pub fn is_default_hrp(&self) -> bool {
        self.hrp.as_str().eq_ignore_ascii_case(DEFAULT_ADDRESS_HRP)
    }
}

fn to_array(raw: &[u8]) -> Result<[u8; ADDRESS_LEN], AddressError> {
    raw.try_into().map_err(|_| AddressError::InvalidLength {
        expected: ADDRESS_LEN,
        got: raw.len(),
    })
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode().map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}:{})", self.hrp, self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = self.encode().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}
