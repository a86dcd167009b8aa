use sha2::{Digest, Sha256};

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    let out = h.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

/// Short, non-reversible label for key material: hex of the first 8 bytes of
/// sha256(material). Safe to log.
pub fn key_fingerprint(material: &[u8]) -> String {
    hex::encode(&sha256(material)[..8])
}
