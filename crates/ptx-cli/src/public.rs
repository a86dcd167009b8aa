//! Committee public configuration
//!
//! The key ceremony publishes a small JSON document describing the
//! committee:
//!
//! ```json
//! {"group_pubkey": "<base64>", "threshold": 3, "n": 4}
//! ```
//!
//! `group_pubkey` is a compressed BLS12-381 G1 point, so exactly 48 bytes.

use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ptx_crypto::GroupPublicKey;

/// Length of a compressed G1 group public key.
pub const GROUP_PUBKEY_LEN: usize = 48;

#[derive(Debug, Error)]
pub enum PublicConfigError {
    #[error("Failed to read public config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse public config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing group_pubkey")]
    MissingGroupKey,

    #[error("group_pubkey is not valid base64")]
    InvalidBase64,

    #[error("invalid group_pubkey length: {len} bytes, expected {GROUP_PUBKEY_LEN}")]
    InvalidLength { len: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPublicConfig {
    #[serde(default)]
    group_pubkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
}

/// Parsed and validated committee public configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitteePublicConfig {
    pub group_pubkey: Vec<u8>,
    pub threshold: Option<u32>,
    pub n: Option<u32>,
}

impl CommitteePublicConfig {
    /// Load and validate from a JSON file
    pub fn load(path: &Path) -> Result<Self, PublicConfigError> {
        let content = std::fs::read(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, PublicConfigError> {
        let raw: RawPublicConfig = serde_json::from_slice(bytes)?;
        if raw.group_pubkey.is_empty() {
            return Err(PublicConfigError::MissingGroupKey);
        }
        let group_pubkey = base64::engine::general_purpose::STANDARD
            .decode(raw.group_pubkey.trim())
            .map_err(|_| PublicConfigError::InvalidBase64)?;
        if group_pubkey.len() != GROUP_PUBKEY_LEN {
            return Err(PublicConfigError::InvalidLength {
                len: group_pubkey.len(),
            });
        }
        Ok(Self {
            group_pubkey,
            threshold: raw.threshold,
            n: raw.n,
        })
    }

    /// Group key in raw form, ready for derivation
    pub fn group_key(&self) -> GroupPublicKey {
        GroupPublicKey::Raw(self.group_pubkey.clone())
    }
}
