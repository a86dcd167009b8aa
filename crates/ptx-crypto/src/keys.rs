//! Group key handling and symmetric key derivation.
//!
//! The committee publishes its aggregate public key in one of three external
//! encodings. Whatever the encoding, the raw key bytes are hashed with
//! SHA-256 and the digest is used directly as the AES-256 key. Both the
//! encrypting client and the committee run this derivation independently, so
//! it must be byte-exact.

use std::fmt;

use base64::Engine;
use constant_time_eq::constant_time_eq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::hash::{key_fingerprint, sha256};

/// Length of the derived symmetric key in bytes.
pub const SYMMETRIC_KEY_LEN: usize = 32;

const HEX_PREFIX: &str = "0x";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed group key encoding: {0}")]
    MalformedKeyEncoding(&'static str),
}

/// Group public key as received from the outside world.
///
/// The variant is decided once, at the boundary, by [`GroupPublicKey::parse`].
/// Conversion to raw bytes is a single exhaustive match with no fallback
/// between encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPublicKey {
    /// Raw key bytes, used as-is.
    Raw(Vec<u8>),
    /// Hex digits that followed a `0x` prefix (prefix stripped).
    Hex(String),
    /// Standard-alphabet, padded base64 text.
    Base64(String),
}

impl GroupPublicKey {
    /// Classify a textual key. Surrounding whitespace is ignored; a `0x`
    /// prefix means hex, anything else is base64.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.strip_prefix(HEX_PREFIX) {
            Some(digits) => Self::Hex(digits.to_string()),
            None => Self::Base64(trimmed.to_string()),
        }
    }

    /// Name of the encoding, for logs and CLI output.
    pub fn encoding(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Hex(_) => "hex",
            Self::Base64(_) => "base64",
        }
    }

    /// Decode to the canonical raw byte form that gets hashed.
    pub fn to_raw_bytes(&self) -> Result<Vec<u8>, KeyError> {
        match self {
            Self::Raw(bytes) => Ok(bytes.clone()),
            Self::Hex(digits) => {
                if digits.is_empty() {
                    return Err(KeyError::MalformedKeyEncoding(
                        "no hex digits after 0x prefix",
                    ));
                }
                hex::decode(digits).map_err(|e| match e {
                    hex::FromHexError::OddLength => {
                        KeyError::MalformedKeyEncoding("odd number of hex digits")
                    }
                    _ => KeyError::MalformedKeyEncoding("non-hex character after 0x prefix"),
                })
            }
            Self::Base64(text) => base64::engine::general_purpose::STANDARD
                .decode(text)
                .map_err(|_| KeyError::MalformedKeyEncoding("invalid base64")),
        }
    }
}

impl From<Vec<u8>> for GroupPublicKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(bytes)
    }
}

impl From<&[u8]> for GroupPublicKey {
    fn from(bytes: &[u8]) -> Self {
        Self::Raw(bytes.to_vec())
    }
}

impl From<&str> for GroupPublicKey {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// 32-byte AES-256 key derived from a group public key.
///
/// Lives only for the duration of one encryption or decryption. Zeroized on
/// drop; `Debug` shows a fingerprint, never the key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_LEN]);

impl SymmetricKey {
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_LEN] {
        &self.0
    }

    /// Loggable identifier of this key.
    pub fn fingerprint(&self) -> String {
        key_fingerprint(&self.0)
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey({})", self.fingerprint())
    }
}

/// SHA-256 over raw key bytes. Zero-length input is allowed.
pub fn derive_key_from_bytes(raw: &[u8]) -> SymmetricKey {
    SymmetricKey(sha256(raw))
}

/// Decode `key` to raw bytes and hash it into a [`SymmetricKey`].
pub fn derive_key(key: &GroupPublicKey) -> Result<SymmetricKey, KeyError> {
    let mut raw = key.to_raw_bytes()?;
    let derived = derive_key_from_bytes(&raw);
    raw.zeroize();
    tracing::debug!(
        encoding = key.encoding(),
        key_fp = %derived.fingerprint(),
        "derived symmetric key"
    );
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_OF_ZERO_BYTE: &str =
        "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d";

    #[test]
    fn parse_classifies_by_prefix() {
        assert_eq!(GroupPublicKey::parse("0xAbCd"), GroupPublicKey::Hex("AbCd".into()));
        assert_eq!(GroupPublicKey::parse("AA=="), GroupPublicKey::Base64("AA==".into()));
        assert_eq!(GroupPublicKey::parse("  0x00\n"), GroupPublicKey::Hex("00".into()));
        // only a lowercase x marks hex
        assert_eq!(GroupPublicKey::parse("0X00"), GroupPublicKey::Base64("0X00".into()));
    }

    #[test]
    fn zero_byte_in_every_encoding_derives_same_key() {
        let raw = derive_key(&GroupPublicKey::Raw(vec![0x00])).unwrap();
        let hex = derive_key(&GroupPublicKey::parse("0x00")).unwrap();
        let b64 = derive_key(&GroupPublicKey::parse("AA==")).unwrap();

        assert_eq!(hex::encode(raw.as_bytes()), SHA256_OF_ZERO_BYTE);
        assert_eq!(raw, hex);
        assert_eq!(raw, b64);
    }

    #[test]
    fn hex_prefix_wins_over_valid_base64() {
        // "0x00" is also valid base64 for the bytes d3 1d 34.
        let as_hex = derive_key(&GroupPublicKey::parse("0x00")).unwrap();
        assert_eq!(as_hex, derive_key_from_bytes(&[0x00]));
        assert_ne!(as_hex, derive_key_from_bytes(&[0xd3, 0x1d, 0x34]));
    }

    #[test]
    fn uppercase_hex_digits_accepted() {
        let upper = derive_key(&GroupPublicKey::parse("0xDEADBEEF")).unwrap();
        let lower = derive_key(&GroupPublicKey::parse("0xdeadbeef")).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn invalid_hex_after_prefix_is_rejected() {
        let err = derive_key(&GroupPublicKey::parse("0xzz")).unwrap_err();
        assert!(matches!(err, KeyError::MalformedKeyEncoding(_)));
    }

    #[test]
    fn bare_prefix_and_odd_length_are_rejected() {
        assert!(derive_key(&GroupPublicKey::parse("0x")).is_err());
        assert_eq!(
            derive_key(&GroupPublicKey::parse("0x000")).unwrap_err(),
            KeyError::MalformedKeyEncoding("odd number of hex digits")
        );
    }

    #[test]
    fn invalid_base64_is_rejected() {
        // missing padding
        assert!(derive_key(&GroupPublicKey::parse("AA")).is_err());
        // outside the alphabet
        assert!(derive_key(&GroupPublicKey::parse("not*base64")).is_err());
        // url-safe alphabet is not accepted
        assert!(derive_key(&GroupPublicKey::parse("-_8=")).is_err());
    }

    #[test]
    fn empty_input_hashes_to_sha256_of_nothing() {
        let from_text = derive_key(&GroupPublicKey::parse("")).unwrap();
        let from_raw = derive_key(&GroupPublicKey::Raw(Vec::new())).unwrap();
        assert_eq!(from_text, from_raw);
        assert_eq!(
            hex::encode(from_raw.as_bytes()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn debug_output_hides_key() {
        let key = derive_key_from_bytes(&[0x00]);
        let shown = format!("{key:?}");
        assert!(!shown.contains(SHA256_OF_ZERO_BYTE));
        assert!(shown.contains(&key.fingerprint()));
    }

    #[test]
    fn error_message_does_not_echo_input() {
        let err = derive_key(&GroupPublicKey::parse("0xsecretzz")).unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }
}
