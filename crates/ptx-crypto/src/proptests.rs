
#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use proptest::prelude::*;

    use crate::cipher::CipherError;
    use crate::envelope::{decrypt_private_tx, encrypt_private_tx, EnvelopeError};
    use crate::keys::{derive_key, derive_key_from_bytes, GroupPublicKey, SymmetricKey};
    use crate::tx::{CanonicalTx, InnerTransaction, PayloadKind};

    fn kind_strategy() -> impl Strategy<Value = Option<PayloadKind>> {
        prop_oneof![
            Just(None),
            Just(Some(PayloadKind::PlaintextV1)),
            Just(Some(PayloadKind::AuctionBidV1)),
        ]
    }

    prop_compose! {
        fn inner_tx()(
            kind in kind_strategy(),
            from in "(?s).{1,24}",
            nonce in any::<u64>(),
            gas in any::<Option<u64>>(),
            fee in any::<Option<u64>>(),
            bid in any::<Option<u64>>(),
            fee_recipient in proptest::option::of("(?s).{0,24}"),
        ) -> InnerTransaction {
            InnerTransaction { kind, from, nonce, gas, fee, bid, fee_recipient }
        }
    }

    proptest! {
        // Same raw bytes, any encoding, same key.
        #[test]
        fn test_key_derivation_encoding_independent(raw in proptest::collection::vec(any::<u8>(), 1..64)) {
            let expected = derive_key_from_bytes(&raw);
            let from_raw = derive_key(&GroupPublicKey::Raw(raw.clone())).unwrap();
            let from_hex = derive_key(&GroupPublicKey::parse(&format!("0x{}", hex::encode(&raw)))).unwrap();
            let from_upper_hex = derive_key(&GroupPublicKey::parse(&format!("0x{}", hex::encode_upper(&raw)))).unwrap();
            let from_b64 = derive_key(&GroupPublicKey::parse(&BASE64.encode(&raw))).unwrap();

            prop_assert_eq!(&from_raw, &expected);
            prop_assert_eq!(&from_hex, &expected);
            prop_assert_eq!(&from_upper_hex, &expected);
            prop_assert_eq!(&from_b64, &expected);
        }

        // A non-hex character after 0x never yields a key.
        #[test]
        fn test_malformed_hex_never_derives(
            prefix in "[0-9a-f]{0,8}",
            bad in "[g-zG-Z!@#$%^&*]",
            suffix in "[0-9a-f]{0,8}",
        ) {
            let text = format!("0x{prefix}{bad}{suffix}");
            prop_assert!(derive_key(&GroupPublicKey::parse(&text)).is_err());
        }

        // The hand-written encoder agrees with a serde_json encoding of the
        // same struct, including string escaping.
        #[test]
        fn test_canonical_bytes_match_serde(tx in inner_tx()) {
            let canonical = tx.canonicalize().unwrap();
            prop_assert_eq!(canonical.to_bytes(), serde_json::to_vec(&canonical).unwrap());
            prop_assert_eq!(CanonicalTx::from_bytes(&canonical.to_bytes()).unwrap(), canonical);
        }

        #[test]
        fn test_envelope_round_trip(tx in inner_tx(), target_height in any::<u64>(), key in any::<Vec<u8>>()) {
            let group_key = GroupPublicKey::Raw(key);
            let env = encrypt_private_tx(&group_key, target_height, &tx).unwrap();

            prop_assert_eq!(&env.from, &tx.from);
            prop_assert_eq!(env.nonce, tx.nonce);
            prop_assert_eq!(env.target_height, target_height);
            prop_assert_eq!(decrypt_private_tx(&group_key, &env).unwrap(), tx.canonicalize().unwrap());
        }

        #[test]
        fn test_envelope_freshness(tx in inner_tx()) {
            let group_key = GroupPublicKey::parse("0x00");
            let a = encrypt_private_tx(&group_key, 1, &tx).unwrap();
            let b = encrypt_private_tx(&group_key, 1, &tx).unwrap();

            prop_assert_ne!(&a.ciphertext, &b.ciphertext);
            prop_assert_ne!(&a.ephemeral_key, &b.ephemeral_key);
            prop_assert_eq!(
                decrypt_private_tx(&group_key, &a).unwrap(),
                decrypt_private_tx(&group_key, &b).unwrap()
            );
        }

        #[test]
        fn test_single_bit_flip_rejected(tx in inner_tx(), bit in any::<prop::sample::Index>()) {
            let group_key = GroupPublicKey::parse("0x00");
            let mut env = encrypt_private_tx(&group_key, 1, &tx).unwrap();

            let mut blob = BASE64.decode(&env.ciphertext).unwrap();
            let i = bit.index(blob.len() * 8);
            blob[i / 8] ^= 1 << (i % 8);
            env.ciphertext = BASE64.encode(&blob);

            prop_assert_eq!(
                decrypt_private_tx(&group_key, &env).unwrap_err(),
                EnvelopeError::Decryption(CipherError::AuthenticationFailed)
            );
        }
    }

    #[test]
    fn test_symmetric_key_zeroize_on_drop() {
        fn assert_zeroize_on_drop<T: zeroize::ZeroizeOnDrop>() {}
        assert_zeroize_on_drop::<SymmetricKey>();
    }
}
