//! Core ledger types for transaction validation

use serde::{Deserialize, Serialize};
use std::fmt;

/// 256-bit hash: transaction ids and asset ids
pub type Hash256 = [u8; 32];

/// 160-bit hash: destination script hashes
pub type Hash160 = [u8; 20];

/// Number of decimal places carried by every amount on the ledger.
pub const FIXED8_DECIMALS: u32 = 8;

/// Fixed-point amount with 8 decimal places, stored as a signed 64-bit
/// raw value.
///
/// All value arithmetic on consensus paths is checked; a sum that cannot
/// be represented is reported to the caller rather than wrapped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed8(i64);

impl Fixed8 {
    pub const ZERO: Fixed8 = Fixed8(0);

    /// One whole unit (10^8 raw).
    pub const ONE: Fixed8 = Fixed8(100_000_000);

    /// Builds an amount from its raw 10^-8 representation.
    pub const fn from_raw(raw: i64) -> Self {
        Fixed8(raw)
    }

    /// Builds an amount from a whole number of units.
    ///
    /// Returns `None` when `units * 10^8` does not fit in 64 bits.
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(Self::ONE.0).map(Fixed8)
    }

    /// Raw 10^-8 representation.
    pub const fn raw(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Fixed8) -> Option<Fixed8> {
        self.0.checked_add(other.0).map(Fixed8)
    }

    pub fn checked_sub(self, other: Fixed8) -> Option<Fixed8> {
        self.0.checked_sub(other.0).map(Fixed8)
    }

    pub fn checked_neg(self) -> Option<Fixed8> {
        self.0.checked_neg().map(Fixed8)
    }

    pub fn abs(self) -> Fixed8 {
        Fixed8(self.0.abs())
    }
}

impl fmt::Display for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divisor = 10i64.pow(FIXED8_DECIMALS);
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let whole = magnitude / divisor as u64;
        let frac = magnitude % divisor as u64;
        write!(f, "{}{}.{:08}", sign, whole, frac)
    }
}

/// A reference to the output a transaction spends.
///
/// Identity is by value over both fields; inputs are used directly as
/// map keys during reference resolution and conflict scans.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TxInput {
    /// Id of the transaction whose output is being spent.
    pub prev_hash: Hash256,
    /// Index of that output within the referenced transaction.
    pub prev_index: u16,
}

impl fmt::Display for TxInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.prev_hash), self.prev_index)
    }
}

/// A value assignment to a destination script.
///
/// Decoded outputs never carry a zero value; that is rejected at the
/// codec boundary. Negative values are representable and are subject to
/// the asset-authority rules during verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxOutput {
    /// Asset being assigned.
    pub asset_id: Hash256,
    /// Amount assigned, in 10^-8 units of the asset.
    pub value: Fixed8,
    /// Hash of the script that may spend this output.
    pub script_hash: Hash160,
}

/// Net value change for one asset within one transaction.
///
/// A positive amount means the transaction destroys value of the asset
/// (inputs exceed outputs); a negative amount means it issues value
/// (outputs exceed inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub asset_id: Hash256,
    pub amount: Fixed8,
}

/// The on-ledger record created by an asset-registration transaction.
///
/// `total_supply == 0` marks an open-ended asset whose circulating
/// amount is governed by its issuer; a nonzero value fixes the supply
/// forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistration {
    /// Fixed total supply, or zero for an open-ended asset.
    pub total_supply: Fixed8,
    /// Decimal precision the asset is divisible to.
    pub precision: u8,
    /// Script hash authorized to issue the asset.
    pub issuer: Hash160,
    /// Script hash authorized to administer the asset.
    pub admin: Hash160,
}
