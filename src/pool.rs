//! Pending-transaction pool shared by concurrent validators

use crate::transaction::Transaction;
use crate::types::{Hash256, TxInput};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Why a transaction was refused admission to the pool.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("transaction already pooled")]
    AlreadyPooled,

    #[error("transaction spends an input held by a pooled transaction")]
    Conflicting,
}

/// Transactions accepted for relay but not yet committed to a block,
/// keyed by id.
///
/// The map sits behind a reader/writer lock: the conflict scan takes the
/// read side and sees a consistent snapshot for the duration of the
/// scan, while [`PendingPool::try_admit`] takes the write side and
/// re-checks before inserting, so two transactions spending the same
/// output can never both be admitted. The scan itself parallelizes over
/// entries — it only reads.
#[derive(Debug, Default)]
pub struct PendingPool {
    entries: RwLock<HashMap<Hash256, Arc<Transaction>>>,
}

impl PendingPool {
    pub fn new() -> Self {
        PendingPool {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Whether any pooled transaction spends one of `tx`'s inputs
    /// (pseudo-inputs included).
    ///
    /// A pooled entry with the same id as `tx` is skipped: re-validating
    /// an already-pooled transaction must not flag a conflict with its
    /// own prior entry.
    pub fn conflicts_with(&self, tx: &Transaction) -> bool {
        let entries = self.entries.read();
        conflicts_locked(&entries, tx)
    }

    /// Admits a transaction after a final conflict re-check under the
    /// write lock.
    ///
    /// Verification is the caller's responsibility; admission only
    /// guarantees the pool never holds two entries spending the same
    /// output.
    pub fn try_admit(&self, tx: Arc<Transaction>) -> Result<(), PoolError> {
        let mut entries = self.entries.write();
        let id = tx.id();
        if entries.contains_key(&id) {
            return Err(PoolError::AlreadyPooled);
        }
        if conflicts_locked(&entries, &tx) {
            debug!(tx = %hex::encode(id), "pool admission refused: conflicting inputs");
            return Err(PoolError::Conflicting);
        }
        entries.insert(id, tx);
        debug!(tx = %hex::encode(id), pooled = entries.len(), "transaction admitted to pool");
        Ok(())
    }

    /// Removes a transaction by id and returns it, or `None`.
    pub fn remove(&self, id: &Hash256) -> Option<Arc<Transaction>> {
        self.entries.write().remove(id)
    }

    /// Batch removal, typically after the transactions were committed in
    /// a block. Missing ids are ignored.
    pub fn remove_batch(&self, ids: &[Hash256]) {
        let mut entries = self.entries.write();
        for id in ids {
            entries.remove(id);
        }
    }

    pub fn get(&self, id: &Hash256) -> Option<Arc<Transaction>> {
        self.entries.read().get(id).cloned()
    }

    pub fn contains(&self, id: &Hash256) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// A point-in-time copy of the pool's entries.
    pub fn snapshot(&self) -> Vec<Arc<Transaction>> {
        self.entries.read().values().cloned().collect()
    }
}

fn conflicts_locked(entries: &HashMap<Hash256, Arc<Transaction>>, tx: &Transaction) -> bool {
    let candidate_id = tx.id();
    let candidate: HashSet<&TxInput> = tx.all_inputs().collect();
    if candidate.is_empty() {
        return false;
    }
    entries.par_iter().any(|(id, pooled)| {
        *id != candidate_id && pooled.all_inputs().any(|input| candidate.contains(input))
    })
}
