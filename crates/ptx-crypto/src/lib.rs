#![forbid(unsafe_code)]

//! Private transaction envelopes.
//!
//! A client hides an inner transaction until a target height by sealing it
//! under a key derived from the committee's group public key:
//!
//! - [`keys`]: group key encodings and `sha256` key derivation
//! - [`tx`]: inner transaction model and canonical encoding
//! - [`cipher`]: AES-256-GCM `nonce || ciphertext || tag` framing
//! - [`envelope`]: the `private_v1` outer envelope, encrypt and open

pub mod cipher;
pub mod entropy;
pub mod envelope;
pub mod hash;
pub mod keys;
pub mod tx;

#[cfg(test)]
mod proptests;

pub use envelope::{
    decrypt_private_tx, encrypt_private_tx, EnvelopeEncryptor, EnvelopeError, TxEnvelope,
};
pub use keys::{derive_key, GroupPublicKey, KeyError, SymmetricKey};
pub use tx::{CanonicalTx, DecodedPayload, InnerTransaction, PayloadKind, TxError, TxType};
