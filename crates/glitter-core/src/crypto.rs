//! secp256k1 recoverable signatures over Keccak-256 digests.
//!
//! Signing uses RFC 6979 deterministic nonces, so the same key and message
//! always produce the same 65-byte `r || s || v` signature, where `v` is the
//! recovery id (0 or 1). The public key can be reconstructed from the digest
//! and the signature alone.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

use crate::constants::{ADDRESS_LEN, COMPRESSED_PUBKEY_LEN, SIGNATURE_LEN, UNCOMPRESSED_PUBKEY_LEN};
use crate::error::CryptoError;

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// A secp256k1 secret scalar.
///
/// The underlying key is zeroized on drop and never printed.
pub struct SecretKey {
    signing_key: SigningKey,
}

impl SecretKey {
    /// Load a secret from 32 big-endian bytes.
    ///
    /// Fails with `SigningError` for zero, for values at or above the curve
    /// order and for any length other than 32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|_| CryptoError::SigningError("private key is not a valid secp256k1 scalar".into()))?;
        Ok(Self { signing_key })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: *self.signing_key.verifying_key(),
        }
    }

    /// Hash `message` with Keccak-256 and sign the digest.
    pub fn sign(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        self.sign_digest(&keccak256(message))
    }

    /// Sign an already computed 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::SigningError(e.to_string()))?;
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(bytes))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// A secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Parse a SEC1 encoded key, compressed (33 bytes) or uncompressed (65).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != COMPRESSED_PUBKEY_LEN && bytes.len() != UNCOMPRESSED_PUBKEY_LEN {
            return Err(CryptoError::InvalidPublicKey);
        }
        let verifying_key = VerifyingKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key })
    }

    pub fn to_compressed(&self) -> [u8; COMPRESSED_PUBKEY_LEN] {
        let mut out = [0u8; COMPRESSED_PUBKEY_LEN];
        out.copy_from_slice(self.verifying_key.to_encoded_point(true).as_bytes());
        out
    }

    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_PUBKEY_LEN] {
        let mut out = [0u8; UNCOMPRESSED_PUBKEY_LEN];
        out.copy_from_slice(self.verifying_key.to_encoded_point(false).as_bytes());
        out
    }

    /// Low 20 bytes of Keccak-256 over the uncompressed point without its
    /// `0x04` prefix.
    pub fn address_bytes(&self) -> [u8; ADDRESS_LEN] {
        let digest = keccak256(&self.to_uncompressed()[1..]);
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest[32 - ADDRESS_LEN..]);
        out
    }

    /// Verify `signature` over the Keccak-256 digest of `message`.
    pub fn verify(&self, message: &[u8], signature: &RecoverableSignature) -> Result<(), CryptoError> {
        let sig = signature.signature()?;
        self.verifying_key
            .verify_prehash(&keccak256(message), &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_compressed()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_compressed()))
    }
}

/// A 65-byte `r || s || v` signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature([u8; SIGNATURE_LEN]);

impl RecoverableSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidSignature)?;
        RecoveryId::from_byte(array[64]).ok_or(CryptoError::InvalidSignature)?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn recovery_id(&self) -> u8 {
        self.0[64]
    }

    /// Reconstruct the signer's public key from a 32-byte digest.
    pub fn recover_digest(&self, digest: &[u8; 32]) -> Result<PublicKey, CryptoError> {
        let sig = self.signature()?;
        let recovery_id = RecoveryId::from_byte(self.0[64]).ok_or(CryptoError::InvalidSignature)?;
        let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
            .map_err(|_| CryptoError::RecoveryFailed)?;
        Ok(PublicKey { verifying_key })
    }

    fn signature(&self) -> Result<Signature, CryptoError> {
        Signature::from_slice(&self.0[..64]).map_err(|_| CryptoError::InvalidSignature)
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", hex::encode(self.0))
    }
}

/// Sign `message` with a raw 32-byte private key.
pub fn sign(private_key: &[u8], message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
    SecretKey::from_bytes(private_key)?.sign(message)
}

/// Recover the public key that signed `message`.
pub fn recover(message: &[u8], signature: &RecoverableSignature) -> Result<PublicKey, CryptoError> {
    signature.recover_digest(&keccak256(message))
}

/// Check that `signature` over `message` recovers to `public_key`.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &RecoverableSignature) -> Result<(), CryptoError> {
    if recover(message, signature)? == *public_key {
        Ok(())
    } else {
        Err(CryptoError::VerificationFailed)
    }
}
