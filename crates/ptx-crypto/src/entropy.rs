//! Randomness capability for nonces and ephemeral keys.
//!
//! Only generators marked [`CryptoRng`] can act as an [`EntropySource`]; a
//! predictable nonce under a fixed group key breaks AES-GCM outright.

use rand_core::{CryptoRng, RngCore};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("secure random source failed")]
pub struct EntropyError;

/// Source of secure random bytes.
pub trait EntropySource {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

impl<R: RngCore + CryptoRng + ?Sized> EntropySource for R {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.try_fill_bytes(dest).map_err(|_| EntropyError)
    }
}

/// Draw a fixed-size array from `source`.
pub fn random_array<const N: usize, E: EntropySource + ?Sized>(
    source: &mut E,
) -> Result<[u8; N], EntropyError> {
    let mut out = [0u8; N];
    source.fill(&mut out)?;
    Ok(out)
}
