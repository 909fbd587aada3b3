//! Property tests for the wire codec and identity hashing

use proptest::prelude::*;
use utxo_core::{AssetRegistration, Fixed8, Transaction, TransactionKind, TxInput, TxOutput};

fn arb_input() -> impl Strategy<Value = TxInput> {
    (any::<[u8; 32]>(), any::<u16>()).prop_map(|(prev_hash, prev_index)| TxInput {
        prev_hash,
        prev_index,
    })
}

fn arb_output() -> impl Strategy<Value = TxOutput> {
    (
        any::<[u8; 32]>(),
        any::<i64>().prop_filter("outputs must be nonzero", |v| *v != 0),
        any::<[u8; 20]>(),
    )
        .prop_map(|(asset_id, raw, script_hash)| TxOutput {
            asset_id,
            value: Fixed8::from_raw(raw),
            script_hash,
        })
}

fn arb_kind() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![
        Just(TransactionKind::Transfer),
        any::<u32>().prop_map(|nonce| TransactionKind::Mint { nonce }),
        Just(TransactionKind::Issue),
        (
            any::<i64>(),
            any::<u8>(),
            any::<[u8; 20]>(),
            any::<[u8; 20]>()
        )
            .prop_map(|(supply, precision, issuer, admin)| {
                TransactionKind::Register(AssetRegistration {
                    total_supply: Fixed8::from_raw(supply),
                    precision,
                    issuer,
                    admin,
                })
            }),
        proptest::collection::vec(arb_input(), 0..4).prop_map(|mut claims| {
            claims.sort();
            claims.dedup();
            TransactionKind::Claim { claims }
        }),
    ]
}

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (
        arb_kind(),
        proptest::collection::vec(arb_input(), 0..4),
        proptest::collection::vec(arb_output(), 1..4),
        proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..48), 0..3),
    )
        .prop_map(|(kind, mut inputs, outputs, witnesses)| {
            inputs.sort();
            inputs.dedup();
            Transaction::new(kind, inputs, outputs, witnesses)
                .expect("generated transaction is structurally valid")
        })
}

proptest! {
    #[test]
    fn decode_inverts_encode(tx in arb_transaction()) {
        let bytes = tx.encode();
        let decoded = Transaction::decode(&bytes).unwrap();
        prop_assert_eq!(&decoded, &tx);
        prop_assert_eq!(decoded.id(), tx.id());
        // Byte-for-byte round trip.
        prop_assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn unsigned_encoding_is_a_strict_prefix(tx in arb_transaction()) {
        let full = tx.encode();
        let unsigned = tx.encode_unsigned();
        prop_assert!(full.starts_with(&unsigned));
        // The witness-count varint always follows the unsigned prefix.
        prop_assert!(full.len() > unsigned.len());
    }

    #[test]
    fn id_is_equal_for_independently_decoded_copies(tx in arb_transaction()) {
        let bytes = tx.encode();
        let a = Transaction::decode(&bytes).unwrap();
        let b = Transaction::decode(&bytes).unwrap();
        prop_assert_eq!(a.id(), b.id());
        prop_assert_eq!(a.id(), tx.id());
        prop_assert_eq!(a.signing_payload(), tx.signing_payload());
    }

    #[test]
    fn truncation_never_decodes(tx in arb_transaction()) {
        let bytes = tx.encode();
        // Every strict prefix must fail cleanly.
        prop_assert!(Transaction::decode(&bytes[..bytes.len() - 1]).is_err());
        prop_assert!(Transaction::decode(&bytes[..bytes.len() / 2]).is_err());
    }
}
