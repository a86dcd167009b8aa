//! AES-256-GCM framing for private payloads.
//!
//! Blob layout: `nonce(12) || ciphertext || tag(16)`, no associated data.
//! The committee splits the blob at exactly these offsets.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use crate::entropy::{random_array, EntropyError, EntropySource};
use crate::keys::SymmetricKey;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;
/// Length of a sealed empty plaintext.
pub const MIN_BLOB_LEN: usize = NONCE_LEN + TAG_LEN;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("AEAD rejected key or nonce")]
    Encryption,
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("blob too short: {len} bytes, need at least {MIN_BLOB_LEN}")]
    BlobTooShort { len: usize },
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

/// Split view of a sealed blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobParts<'a> {
    pub nonce: &'a [u8],
    pub body: &'a [u8],
    pub tag: &'a [u8],
}

/// Split a blob as first-12 / middle / last-16 bytes.
pub fn split_blob(blob: &[u8]) -> Result<BlobParts<'_>, CipherError> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(CipherError::BlobTooShort { len: blob.len() });
    }
    let (nonce, rest) = blob.split_at(NONCE_LEN);
    let (body, tag) = rest.split_at(rest.len() - TAG_LEN);
    Ok(BlobParts { nonce, body, tag })
}

/// AES-256-GCM keyed by a derived group key.
pub struct SymmetricEngine {
    aead: Aes256Gcm,
}

impl SymmetricEngine {
    pub fn new(key: &SymmetricKey) -> Result<Self, CipherError> {
        let aead =
            Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::Encryption)?;
        Ok(Self { aead })
    }

    /// Encrypt under a fresh random nonce.
    ///
    /// Returns: nonce(12) || ciphertext || tag(16)
    pub fn seal<E: EntropySource + ?Sized>(
        &self,
        plaintext: &[u8],
        entropy: &mut E,
    ) -> Result<Vec<u8>, CipherError> {
        let nonce: [u8; NONCE_LEN] = random_array(entropy)?;
        self.seal_with_nonce(&nonce, plaintext)
    }

    pub(crate) fn seal_with_nonce(
        &self,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let ct = self
            .aead
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| CipherError::Encryption)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ct.len());
        out.extend_from_slice(nonce);
        out.extend_from_slice(&ct);
        Ok(out)
    }

    /// Decrypt a blob produced by [`seal`](Self::seal).
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        let parts = split_blob(blob)?;
        self.aead
            .decrypt(Nonce::from_slice(parts.nonce), &blob[NONCE_LEN..])
            .map_err(|_| CipherError::AuthenticationFailed)
    }
}
