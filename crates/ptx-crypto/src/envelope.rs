//! Private transaction envelopes (`private_v1`).
//!
//! Seals a canonical inner transaction under `sha256(group_pubkey)` with
//! AES-256-GCM and wraps it with the cleartext fields needed for ordering
//! and admission before decryption.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::cipher::{CipherError, SymmetricEngine, MIN_BLOB_LEN};
use crate::entropy::{random_array, EntropyError, EntropySource};
use crate::keys::{derive_key, GroupPublicKey, KeyError};
use crate::tx::{CanonicalTx, InnerTransaction, TxError, TxType};

/// Length of the per-envelope ephemeral key.
pub const EPHEMERAL_KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("key derivation failed: {0}")]
    KeyDerivation(#[from] KeyError),
    #[error("inner transaction rejected: {0}")]
    Serialization(#[from] TxError),
    #[error("encryption failed: {0}")]
    Encryption(CipherError),
    #[error("decryption failed: {0}")]
    Decryption(CipherError),
    #[error(transparent)]
    Entropy(#[from] EntropyError),
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(&'static str),
    #[error("cleartext from/nonce do not match the encrypted payload")]
    CleartextMismatch,
}

/// Outer envelope as submitted to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEnvelope {
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub from: String,
    pub nonce: u64,
    /// base64(nonce(12) || ciphertext || tag(16))
    pub ciphertext: String,
    /// base64 of 32 random bytes
    pub ephemeral_key: String,
    pub target_height: u64,
}

impl TxEnvelope {
    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        BASE64
            .decode(&self.ciphertext)
            .map_err(|_| EnvelopeError::InvalidEnvelope("ciphertext is not valid base64"))
    }

    pub fn ephemeral_key_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        BASE64
            .decode(&self.ephemeral_key)
            .map_err(|_| EnvelopeError::InvalidEnvelope("ephemeral_key is not valid base64"))
    }

    /// Structural checks that need no key.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.tx_type != TxType::PrivateV1 {
            return Err(EnvelopeError::InvalidEnvelope("type is not private_v1"));
        }
        if self.from.is_empty() {
            return Err(EnvelopeError::InvalidEnvelope("from is empty"));
        }
        if self.ciphertext_bytes()?.len() < MIN_BLOB_LEN {
            return Err(EnvelopeError::InvalidEnvelope("ciphertext shorter than nonce and tag"));
        }
        if self.ephemeral_key_bytes()?.len() != EPHEMERAL_KEY_LEN {
            return Err(EnvelopeError::InvalidEnvelope("ephemeral_key must be 32 bytes"));
        }
        Ok(())
    }
}

/// Builds `private_v1` envelopes.
///
/// Holds no state besides its entropy source; one instance per thread, or
/// [`encrypt_private_tx`] for one-off use.
pub struct EnvelopeEncryptor<E = OsRng> {
    entropy: E,
}

impl EnvelopeEncryptor<OsRng> {
    pub fn new() -> Self {
        Self { entropy: OsRng }
    }
}

impl Default for EnvelopeEncryptor<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntropySource> EnvelopeEncryptor<E> {
    pub fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }

    /// Encrypt `tx` for the committee holding `group_key`, releasable after
    /// `target_height`.
    ///
    /// The inner transaction is validated before any key or random material
    /// is produced. Draws 12 nonce bytes, then 32 ephemeral key bytes.
    pub fn encrypt(
        &mut self,
        group_key: &GroupPublicKey,
        target_height: u64,
        tx: &InnerTransaction,
    ) -> Result<TxEnvelope, EnvelopeError> {
        let canonical = tx.canonicalize()?;
        let mut plaintext = canonical.to_bytes();

        let key = derive_key(group_key)?;
        let engine = SymmetricEngine::new(&key).map_err(EnvelopeError::Encryption)?;

        let sealed = engine.seal(&plaintext, &mut self.entropy);
        plaintext.zeroize();
        let blob = sealed.map_err(|e| match e {
            CipherError::Entropy(e) => EnvelopeError::Entropy(e),
            other => EnvelopeError::Encryption(other),
        })?;

        let ephemeral: [u8; EPHEMERAL_KEY_LEN] = random_array(&mut self.entropy)?;

        tracing::debug!(
            kind = %canonical.kind,
            target_height,
            blob_len = blob.len(),
            key_fp = %key.fingerprint(),
            "sealed private transaction"
        );

        Ok(TxEnvelope {
            tx_type: TxType::PrivateV1,
            from: canonical.from,
            nonce: canonical.nonce,
            ciphertext: BASE64.encode(&blob),
            ephemeral_key: BASE64.encode(ephemeral),
            target_height,
        })
    }
}

/// Encrypt with the OS random source.
pub fn encrypt_private_tx(
    group_key: &GroupPublicKey,
    target_height: u64,
    tx: &InnerTransaction,
) -> Result<TxEnvelope, EnvelopeError> {
    EnvelopeEncryptor::new().encrypt(group_key, target_height, tx)
}

/// Committee-side inverse of [`EnvelopeEncryptor::encrypt`].
///
/// Re-derives the key, opens the blob and checks that the cleartext
/// `from`/`nonce` match the encrypted ones.
pub fn decrypt_private_tx(
    group_key: &GroupPublicKey,
    env: &TxEnvelope,
) -> Result<CanonicalTx, EnvelopeError> {
    env.validate()?;
    let blob = env.ciphertext_bytes()?;

    let key = derive_key(group_key)?;
    let engine = SymmetricEngine::new(&key).map_err(EnvelopeError::Decryption)?;
    let mut plaintext = engine.open(&blob).map_err(EnvelopeError::Decryption)?;

    let parsed = CanonicalTx::from_bytes(&plaintext);
    plaintext.zeroize();
    let tx = parsed?;

    if tx.from != env.from || tx.nonce != env.nonce {
        return Err(EnvelopeError::CleartextMismatch);
    }

    tracing::debug!(
        kind = %tx.kind,
        target_height = env.target_height,
        key_fp = %key.fingerprint(),
        "opened private transaction"
    );
    Ok(tx)
}
