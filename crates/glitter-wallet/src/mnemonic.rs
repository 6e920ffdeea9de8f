//! BIP-39 mnemonic phrases.

use bip39::Language;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::WalletError;

/// A validated English BIP-39 phrase.
///
/// The phrase is zeroized on drop and never printed. Intermediate
/// `bip39::Mnemonic` values wipe their word indices on drop as well.
#[derive(Clone)]
pub struct Mnemonic {
    phrase: Zeroizing<String>,
    word_count: usize,
}

impl Mnemonic {
    /// Fresh 24-word phrase from 256 bits of OS entropy.
    pub fn generate() -> Result<Self, WalletError> {
        let mut entropy = Zeroizing::new([0u8; 32]);
        rand::rngs::OsRng.fill_bytes(&mut entropy[..]);
        let m = bip39::Mnemonic::from_entropy_in(Language::English, &entropy[..])
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(Self {
            phrase: Zeroizing::new(m.to_string()),
            word_count: m.word_count(),
        })
    }

    /// Parse and validate a phrase.
    ///
    /// Normalizes whitespace and converts to lowercase before checking the
    /// wordlist and checksum.
    pub fn parse(phrase: &str) -> Result<Self, WalletError> {
        let joined = Zeroizing::new(phrase.split_whitespace().collect::<Vec<_>>().join(" "));
        let normalized = Zeroizing::new(joined.to_lowercase());
        let m = bip39::Mnemonic::parse_in(Language::English, normalized.as_str())
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(Self {
            word_count: m.word_count(),
            phrase: normalized,
        })
    }

    /// 64-byte BIP-39 seed with an empty passphrase.
    pub fn to_seed(&self) -> Result<Zeroizing<[u8; 64]>, WalletError> {
        let m = bip39::Mnemonic::parse_in(Language::English, self.phrase.as_str())
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(Zeroizing::new(m.to_seed_normalized("")))
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// The normalized phrase. Handle with care.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &self.word_count)
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}
