//! # utxo-core
//!
//! Transaction-validation core for a multi-asset UTXO ledger.
//!
//! This crate defines the canonical wire encoding of a transaction,
//! derives its identity hash and signing payload, resolves its spend
//! references against ledger state, and applies the consensus rules
//! that decide whether a transaction may be accepted into a pending
//! pool or a block. It encodes the economic invariants the network's
//! safety depends on: no value created from nothing, no double
//! spending, and asset-issuance authority.
//!
//! ## Architecture
//!
//! Data flows through the modules leaf-first:
//!
//! - [`codec`] — deterministic byte layout for transactions
//! - [`hashing`] — content id (double digest) and signing payload
//! - [`references`] — input resolution against the [`ledger`] collaborator
//! - [`balance`] — per-asset net value deltas
//! - [`verifier`] — the multi-flag verification predicate
//! - [`pool`] — the shared pending-transaction pool
//!
//! ## Design Principles
//!
//! 1. **Verification is data, not control flow**: outcomes are a flag
//!    set; only malformed bytes are errors.
//! 2. **Deterministic encoding**: the wire bytes feed the id hash, so
//!    the same logical transaction always encodes identically.
//! 3. **Read-only validation**: the verifier never mutates the
//!    transaction, the pool, or the ledger.
//! 4. **Exact version pinning** for consensus-critical cryptography.
//!
//! ## Usage
//!
//! ```rust
//! use utxo_core::constants::FEE_ASSET_ID;
//! use utxo_core::ledger::MemoryLedger;
//! use utxo_core::pool::PendingPool;
//! use utxo_core::transaction::{Transaction, TransactionKind};
//! use utxo_core::types::{Fixed8, TxOutput};
//! use utxo_core::verifier::verify_transaction;
//!
//! let ledger = MemoryLedger::new();
//! let pool = PendingPool::new();
//!
//! let mint = Transaction::new(
//!     TransactionKind::Mint { nonce: 0 },
//!     vec![],
//!     vec![TxOutput {
//!         asset_id: FEE_ASSET_ID,
//!         value: Fixed8::from_units(50).unwrap(),
//!         script_hash: [0u8; 20],
//!     }],
//!     vec![],
//! )
//! .unwrap();
//!
//! // Wire round-trip preserves identity.
//! let decoded = Transaction::decode(&mint.encode()).unwrap();
//! assert_eq!(decoded.id(), mint.id());
//!
//! // A generation transaction creating the fee asset is valid.
//! assert!(verify_transaction(&mint, &ledger, &pool).is_ok());
//! ```

pub mod balance;
pub mod codec;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod ledger;
pub mod pool;
pub mod references;
pub mod transaction;
pub mod types;
pub mod verifier;
pub mod witness;

// Re-export the vocabulary types at the crate root.
pub use error::{FormatError, Result};
pub use ledger::{Capabilities, Ledger, MemoryLedger};
pub use pool::{PendingPool, PoolError};
pub use transaction::{Transaction, TransactionKind};
pub use types::{
    AssetRegistration, Fixed8, Hash160, Hash256, TransactionResult, TxInput, TxOutput,
};
pub use verifier::{verify_transaction, VerifyFlags};
