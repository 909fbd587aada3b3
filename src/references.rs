//! Resolution of spend references against the ledger

use crate::ledger::Ledger;
use crate::transaction::Transaction;
use crate::types::{Hash256, TxInput, TxOutput};
use std::collections::HashMap;
use tracing::trace;

/// Resolves every input of `tx` to the output it spends.
///
/// Inputs are grouped by referenced transaction id so each prior
/// transaction is fetched from the ledger once. Any unknown id or
/// out-of-range output index fails the whole resolution — a partial
/// view is useless to the balance rules, and "unknown" is a statement
/// about the ledger, not about the transaction, so it is `None` rather
/// than an error.
pub fn resolve(tx: &Transaction, ledger: &dyn Ledger) -> Option<HashMap<TxInput, TxOutput>> {
    resolve_inputs(tx.inputs().iter(), ledger)
}

/// Resolves an arbitrary set of spend references; also used for the
/// pseudo-inputs of claim transactions.
pub(crate) fn resolve_inputs<'a>(
    inputs: impl Iterator<Item = &'a TxInput>,
    ledger: &dyn Ledger,
) -> Option<HashMap<TxInput, TxOutput>> {
    let mut by_prev: HashMap<Hash256, Vec<&TxInput>> = HashMap::new();
    for input in inputs {
        by_prev.entry(input.prev_hash).or_default().push(input);
    }

    let mut resolved = HashMap::new();
    for (prev_hash, group) in by_prev {
        let Some(prev_tx) = ledger.transaction(&prev_hash) else {
            trace!(prev = %hex::encode(prev_hash), "referenced transaction unknown");
            return None;
        };
        for input in group {
            let output = prev_tx.outputs().get(input.prev_index as usize)?;
            resolved.insert(*input, *output);
        }
    }
    Some(resolved)
}
