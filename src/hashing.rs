//! Transaction identity and signing-payload digests

use crate::transaction::Transaction;
use crate::types::{Hash160, Hash256};
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Content id of a transaction: double SHA-256 over the unsigned
/// encoding.
///
/// Witness scripts are excluded, so attaching or replacing signatures
/// never changes a transaction's identity.
pub fn tx_id(tx: &Transaction) -> Hash256 {
    let unsigned = tx.encode_unsigned();
    let digest = sha256d::Hash::hash(&unsigned);
    let mut id = [0u8; 32];
    id.copy_from_slice(&digest);
    id
}

/// The digest each witness signature must cover: a single SHA-256 over
/// the unsigned encoding.
///
/// Signatures cover transaction content but cannot cover themselves,
/// which is why the unsigned form stops before the witness array.
pub fn signing_payload(tx: &Transaction) -> Hash256 {
    let unsigned = tx.encode_unsigned();
    let digest = Sha256::digest(&unsigned);
    let mut payload = [0u8; 32];
    payload.copy_from_slice(&digest);
    payload
}

/// HASH160: RIPEMD160(SHA256(x)), the 160-bit hash destination scripts
/// are addressed by.
pub fn hash160(data: &[u8]) -> Hash160 {
    let sha = Sha256::digest(data);
    let ripemd = Ripemd160::digest(sha);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&ripemd);
    hash
}
