//! Witness script encoding and signature verification
//!
//! A witness script pairs a DER-encoded ECDSA signature with the
//! compressed public key that produced it. The transaction core only
//! derives the signing payload and the required script-hash set; the
//! cryptographic verification itself goes through `secp256k1`.

use crate::hashing;
use crate::types::{Hash160, Hash256};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1};
use tracing::trace;

/// Serializes a witness script: length-prefixed signature, then
/// length-prefixed compressed public key.
pub fn encode_witness(signature: &Signature, pubkey: &PublicKey) -> Vec<u8> {
    let sig = signature.serialize_der();
    let pk = pubkey.serialize();
    let mut out = Vec::with_capacity(2 + sig.len() + pk.len());
    out.push(sig.len() as u8);
    out.extend_from_slice(&sig);
    out.push(pk.len() as u8);
    out.extend_from_slice(&pk);
    out
}

/// Script hash a public key answers for: HASH160 over its compressed
/// serialization.
pub fn script_hash_of(pubkey: &PublicKey) -> Hash160 {
    hashing::hash160(&pubkey.serialize())
}

/// Splits a witness script back into signature and public key. Any
/// structural defect yields `None`; the codec treats witness bytes as
/// opaque, so malformedness here is a verification failure, not a
/// format error.
fn parse_witness(bytes: &[u8]) -> Option<(Signature, PublicKey)> {
    let (sig_len, rest) = bytes.split_first()?;
    if rest.len() < *sig_len as usize {
        return None;
    }
    let (sig_bytes, rest) = rest.split_at(*sig_len as usize);
    let (pk_len, rest) = rest.split_first()?;
    if rest.len() != *pk_len as usize {
        return None;
    }

    let signature = Signature::from_der(sig_bytes).ok()?;
    let pubkey = PublicKey::from_slice(rest).ok()?;
    Some((signature, pubkey))
}

/// Verifies the witness scripts of a transaction against its signing
/// payload and required script hashes.
///
/// `required` must be the sorted distinct hash set from
/// [`Transaction::required_script_hashes`](crate::transaction::Transaction::required_script_hashes);
/// witnesses are matched to it positionally, so signers attach their
/// scripts in that same order. Every required hash needs exactly one
/// witness whose public key hashes to it and whose signature covers the
/// payload.
pub fn verify_witnesses(payload: &Hash256, witnesses: &[Vec<u8>], required: &[Hash160]) -> bool {
    if witnesses.len() != required.len() {
        trace!(
            witnesses = witnesses.len(),
            required = required.len(),
            "witness count mismatch"
        );
        return false;
    }

    let message = match Message::from_digest_slice(payload) {
        Ok(m) => m,
        Err(_) => return false,
    };

    let secp = Secp256k1::new();
    for (witness, script_hash) in witnesses.iter().zip(required) {
        let Some((signature, pubkey)) = parse_witness(witness) else {
            trace!("malformed witness script");
            return false;
        };
        if script_hash_of(&pubkey) != *script_hash {
            trace!(expected = %hex::encode(script_hash), "witness key answers for wrong script");
            return false;
        }
        if secp.verify_ecdsa(&message, &signature, &pubkey).is_err() {
            trace!("witness signature does not cover signing payload");
            return false;
        }
    }
    true
}
