//! Protocol constants and well-known identifiers

use crate::types::{Fixed8, Hash256};

/// Id of the native fee asset. System fees are destroyed in this asset,
/// and it is the only asset a transaction may net-destroy.
pub const FEE_ASSET_ID: Hash256 = [
    0x60, 0x2c, 0x83, 0x1d, 0x4b, 0x55, 0x9c, 0xe7, 0x12, 0x0a, 0xe1, 0xf0, 0x3c, 0x4e, 0x7a,
    0x91, 0xd8, 0x2f, 0x66, 0x05, 0xaa, 0x13, 0xc0, 0x59, 0x7e, 0x84, 0x21, 0x3b, 0xf0, 0x9d,
    0x5c, 0x48,
];

/// Id of the native governance asset. Like the fee asset, it may never
/// appear in a negative output.
pub const GOVERNANCE_ASSET_ID: Hash256 = [
    0xc5, 0x6f, 0x1e, 0x92, 0x0d, 0x37, 0x4a, 0x88, 0x61, 0xbe, 0x29, 0x74, 0x5f, 0x0b, 0xd3,
    0x3a, 0x02, 0xc4, 0x9a, 0xe6, 0x18, 0x70, 0x55, 0x2d, 0xc9, 0x3f, 0x8b, 0x16, 0xa4, 0x07,
    0xe2, 0x9b,
];

/// System fee charged by an asset-registration transaction.
pub const REGISTER_SYSTEM_FEE: Fixed8 = Fixed8::from_raw(500 * 100_000_000);

/// System fee charged by an issuance transaction.
pub const ISSUE_SYSTEM_FEE: Fixed8 = Fixed8::from_raw(5 * 100_000_000);

/// Maximum number of inputs per transaction
pub const MAX_TX_INPUTS: usize = 1000;

/// Maximum number of outputs per transaction
pub const MAX_TX_OUTPUTS: usize = 1000;

/// Maximum number of claim references on a claim transaction
pub const MAX_TX_CLAIMS: usize = 1000;

/// Maximum number of witness scripts per transaction
pub const MAX_WITNESS_SCRIPTS: usize = 256;

/// Maximum size of a single witness script in bytes
pub const MAX_WITNESS_SIZE: usize = 10_000;
