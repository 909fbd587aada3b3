//! Per-asset value conservation arithmetic

use crate::transaction::Transaction;
use crate::types::{Fixed8, Hash256, TransactionResult, TxInput, TxOutput};
use std::collections::HashMap;

/// Computes the net value change per asset for a transaction with
/// resolved references.
///
/// Each referenced output contributes `+value` (consumed), each produced
/// output contributes `-value` (created). Assets whose net change is
/// exactly zero are dropped — a fully balanced asset has nothing to
/// report. The result is sorted by asset id so callers see a
/// deterministic order.
///
/// Sums are accumulated in 128-bit arithmetic; a net that does not fit
/// the fixed-point range yields `None`, which the verifier treats as an
/// imbalance.
pub fn compute_results(
    tx: &Transaction,
    references: &HashMap<TxInput, TxOutput>,
) -> Option<Vec<TransactionResult>> {
    let mut nets: HashMap<Hash256, i128> = HashMap::new();

    for input in tx.inputs() {
        let consumed = references.get(input)?;
        *nets.entry(consumed.asset_id).or_insert(0) += consumed.value.raw() as i128;
    }
    for produced in tx.outputs() {
        *nets.entry(produced.asset_id).or_insert(0) -= produced.value.raw() as i128;
    }

    let mut results = Vec::new();
    for (asset_id, net) in nets {
        if net == 0 {
            continue;
        }
        let amount = i64::try_from(net).ok()?;
        results.push(TransactionResult {
            asset_id,
            amount: Fixed8::from_raw(amount),
        });
    }
    results.sort_by_key(|r| r.asset_id);
    Some(results)
}
