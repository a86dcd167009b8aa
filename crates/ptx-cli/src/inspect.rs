//! Keyless envelope inspection
//!
//! Shows what anyone on the network can see in a private envelope: the
//! cleartext routing fields and the shape of the sealed blob.

use serde::Serialize;
use thiserror::Error;

use ptx_crypto::cipher::split_blob;
use ptx_crypto::TxEnvelope;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Decode error: {0}")]
    DecodeError(String),
}

/// Decoded envelope information
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeInspection {
    /// Outer type tag
    pub tx_type: String,
    /// Cleartext sender
    pub from: String,
    /// Cleartext nonce
    pub nonce: u64,
    /// Release height
    pub target_height: u64,
    /// Decoded ciphertext blob size in bytes
    pub blob_size: usize,
    /// AEAD nonce (hex encoded)
    pub aead_nonce: String,
    /// Encrypted payload length (equals plaintext length)
    pub body_size: usize,
    /// Authentication tag (hex encoded)
    pub tag: String,
    /// Ephemeral key size in bytes
    pub ephemeral_key_size: usize,
    /// Structural problem, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

/// Break an envelope down into its visible parts.
pub fn inspect_envelope(env: &TxEnvelope) -> Result<EnvelopeInspection, InspectError> {
    let blob = env
        .ciphertext_bytes()
        .map_err(|e| InspectError::DecodeError(e.to_string()))?;
    let parts =
        split_blob(&blob).map_err(|e| InspectError::DecodeError(format!("ciphertext: {e}")))?;
    let ephemeral = env
        .ephemeral_key_bytes()
        .map_err(|e| InspectError::DecodeError(e.to_string()))?;

    let problem = env.validate().err().map(|e| e.to_string());

    Ok(EnvelopeInspection {
        tx_type: env.tx_type.to_string(),
        from: env.from.clone(),
        nonce: env.nonce,
        target_height: env.target_height,
        blob_size: blob.len(),
        aead_nonce: hex::encode(parts.nonce),
        body_size: parts.body.len(),
        tag: hex::encode(parts.tag),
        ephemeral_key_size: ephemeral.len(),
        problem,
    })
}
