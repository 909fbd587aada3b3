//! Consensus verification of a single transaction
//!
//! Verification is a pure predicate: it reads the transaction, the
//! ledger, and the pending pool, and returns a set of independent
//! outcome flags. Nothing is committed here — whether a flagged
//! transaction is dropped, deferred, or logged is the caller's policy.

use crate::balance;
use crate::constants::{FEE_ASSET_ID, GOVERNANCE_ASSET_ID};
use crate::ledger::{Capabilities, Ledger};
use crate::pool::PendingPool;
use crate::transaction::Transaction;
use crate::types::{Fixed8, Hash256, TxOutput};
use crate::witness;
use std::collections::HashMap;
use tracing::debug;

bitflags::bitflags! {
    /// Independent verification outcomes; empty means valid.
    ///
    /// Flags accumulate — a transaction can be double-spent and
    /// imbalanced at once. `DOUBLE_SPENT`, `IMBALANCED` and
    /// `INVALID_SIGNATURE` are definitive rejections;
    /// `LACK_OF_INFORMATION` and `INCAPABLE` mean the question could
    /// not be decided against this ledger, and a caller may retry once
    /// more state is available.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VerifyFlags: u8 {
        /// An input is spent by a pooled or committed transaction.
        const DOUBLE_SPENT        = 0b00001;
        /// Value conservation or issuance authority is violated.
        const IMBALANCED          = 0b00010;
        /// The ledger is missing data needed to decide.
        const LACK_OF_INFORMATION = 0b00100;
        /// The ledger backend cannot answer a required query.
        const INCAPABLE           = 0b01000;
        /// A witness script failed signature verification.
        const INVALID_SIGNATURE   = 0b10000;
    }
}

impl VerifyFlags {
    /// True when no stage raised a flag.
    pub fn is_ok(self) -> bool {
        self.is_empty()
    }
}

/// Runs every verification stage and returns the union of raised flags.
///
/// All stages execute even after a flag is raised, with one exception
/// taken from the stage ordering: the ledger spent-index query is
/// skipped once the pool scan has already proven a double-spend.
pub fn verify_transaction(
    tx: &Transaction,
    ledger: &dyn Ledger,
    pool: &PendingPool,
) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();

    // Stage 1: conflicts against the pending pool.
    if pool.conflicts_with(tx) {
        flags |= VerifyFlags::DOUBLE_SPENT;
    }

    // Stage 2: conflicts against committed state.
    if !flags.contains(VerifyFlags::DOUBLE_SPENT) {
        if ledger.capabilities().contains(Capabilities::UNSPENT_INDEXES) {
            if ledger.is_double_spend(tx) {
                flags |= VerifyFlags::DOUBLE_SPENT;
            }
        } else {
            // The check cannot run; the transaction must not pass by
            // default.
            flags |= VerifyFlags::INCAPABLE;
        }
    }

    // Stage 3: who may receive negative outputs, per asset.
    flags |= check_output_authority(tx, ledger);

    // Stage 4: per-asset value conservation and issuance rules.
    flags |= check_balance(tx, ledger);

    // Stage 5: witness signatures over the signing payload.
    flags |= check_witnesses(tx, ledger);

    if !flags.is_empty() {
        debug!(tx = %hex::encode(tx.id()), kind = %tx.kind(), ?flags, "transaction flagged");
    }
    flags
}

/// Negative outputs represent administrative adjustment and are tightly
/// scoped: never for the native assets, only for open-supply registered
/// assets, and only payable to the asset's issuer or administrator.
fn check_output_authority(tx: &Transaction, ledger: &dyn Ledger) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();

    let mut negative_by_asset: HashMap<Hash256, Vec<&TxOutput>> = HashMap::new();
    for output in tx.outputs().iter().filter(|o| o.value.is_negative()) {
        negative_by_asset.entry(output.asset_id).or_default().push(output);
    }

    for (asset_id, outputs) in negative_by_asset {
        if asset_id == FEE_ASSET_ID || asset_id == GOVERNANCE_ASSET_ID {
            flags |= VerifyFlags::IMBALANCED;
            continue;
        }
        let Some(registration) = ledger.asset(&asset_id) else {
            flags |= VerifyFlags::LACK_OF_INFORMATION;
            continue;
        };
        if !registration.total_supply.is_zero() {
            flags |= VerifyFlags::IMBALANCED;
        }
        if outputs.iter().any(|o| {
            o.script_hash != registration.issuer && o.script_hash != registration.admin
        }) {
            flags |= VerifyFlags::IMBALANCED;
        }
    }
    flags
}

/// Value conservation: at most one net-destroyed asset (the fee asset),
/// system fee covered, and issuance only by the variants designated for
/// it.
fn check_balance(tx: &Transaction, ledger: &dyn Ledger) -> VerifyFlags {
    let Some(references) = tx.references(ledger) else {
        return VerifyFlags::LACK_OF_INFORMATION;
    };
    let Some(results) = balance::compute_results(tx, references) else {
        // A net outside the representable range cannot conserve value.
        return VerifyFlags::IMBALANCED;
    };

    let mut flags = VerifyFlags::empty();

    let destroyed: Vec<_> = results.iter().filter(|r| r.amount.is_positive()).collect();
    if destroyed.len() > 1 || destroyed.iter().any(|r| r.asset_id != FEE_ASSET_ID) {
        flags |= VerifyFlags::IMBALANCED;
    }

    let system_fee = tx.system_fee();
    if !system_fee.is_zero() {
        let destroyed_fee = destroyed
            .iter()
            .find(|r| r.asset_id == FEE_ASSET_ID)
            .map(|r| r.amount)
            .unwrap_or(Fixed8::ZERO);
        if destroyed_fee < system_fee {
            flags |= VerifyFlags::IMBALANCED;
        }
    }

    let issued: Vec<_> = results.iter().filter(|r| r.amount.is_negative()).collect();
    if !issued.is_empty() {
        if tx.kind().is_generation() {
            // Generation may only create the fee asset.
            if issued.iter().any(|r| r.asset_id != FEE_ASSET_ID) {
                flags |= VerifyFlags::IMBALANCED;
            }
        } else if !tx.kind().is_issuance() {
            flags |= VerifyFlags::IMBALANCED;
        }
    }
    flags
}

fn check_witnesses(tx: &Transaction, ledger: &dyn Ledger) -> VerifyFlags {
    let Some(required) = tx.required_script_hashes(ledger) else {
        return VerifyFlags::LACK_OF_INFORMATION;
    };
    if witness::verify_witnesses(&tx.signing_payload(), tx.witnesses(), &required) {
        VerifyFlags::empty()
    } else {
        VerifyFlags::INVALID_SIGNATURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ISSUE_SYSTEM_FEE;
    use crate::ledger::MemoryLedger;
    use crate::transaction::TransactionKind;
    use crate::types::{AssetRegistration, Hash160, TxInput};
    use secp256k1::{PublicKey, Secp256k1, SecretKey};
    use std::sync::Arc;

    fn keypair(byte: u8) -> (SecretKey, PublicKey) {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(&[byte; 32]).unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret);
        (secret, public)
    }

    fn witness_for(tx: &Transaction, secret: &SecretKey, public: &PublicKey) -> Vec<u8> {
        let secp = Secp256k1::new();
        let message = secp256k1::Message::from_digest_slice(&tx.signing_payload()).unwrap();
        witness::encode_witness(&secp.sign_ecdsa(&message, secret), public)
    }

    fn fee_output(units: i64, script_hash: Hash160) -> TxOutput {
        TxOutput {
            asset_id: FEE_ASSET_ID,
            value: Fixed8::from_units(units).unwrap(),
            script_hash,
        }
    }

    /// Mints `units` of the fee asset to `script_hash` and commits the
    /// generation transaction to the ledger. Returns the spendable input.
    fn fund(ledger: &MemoryLedger, nonce: u32, units: i64, script_hash: Hash160) -> TxInput {
        let mint = Transaction::new(
            TransactionKind::Mint { nonce },
            vec![],
            vec![fee_output(units, script_hash)],
            vec![],
        )
        .unwrap();
        let id = mint.id();
        ledger.insert(mint);
        TxInput {
            prev_hash: id,
            prev_index: 0,
        }
    }

    #[test]
    fn balanced_signed_transfer_is_ok() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let (secret, public) = keypair(0x11);
        let owner = witness::script_hash_of(&public);

        let coin = fund(&ledger, 1, 100, owner);
        let unsigned = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(100, [9; 20])],
            vec![],
        )
        .unwrap();
        let signed = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(100, [9; 20])],
            vec![witness_for(&unsigned, &secret, &public)],
        )
        .unwrap();

        assert!(verify_transaction(&signed, &ledger, &pool).is_ok());
    }

    #[test]
    fn fee_destruction_is_permitted() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let (secret, public) = keypair(0x11);
        let owner = witness::script_hash_of(&public);

        let coin = fund(&ledger, 1, 100, owner);
        let unsigned = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(97, [9; 20])],
            vec![],
        )
        .unwrap();
        let signed = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(97, [9; 20])],
            vec![witness_for(&unsigned, &secret, &public)],
        )
        .unwrap();

        // Destroying 3 units of the fee asset is an implicit fee.
        assert!(verify_transaction(&signed, &ledger, &pool).is_ok());
    }

    #[test]
    fn destroying_a_non_fee_asset_is_imbalanced() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();

        // Prior transaction holding 10 units of some asset X.
        let prior = Transaction::new(
            TransactionKind::Mint { nonce: 1 },
            vec![],
            vec![TxOutput {
                asset_id: [7; 32],
                value: Fixed8::from_units(10).unwrap(),
                script_hash: [3; 20],
            }],
            vec![],
        )
        .unwrap();
        let prior_id = prior.id();
        ledger.insert(prior);

        let spender = Transaction::new(
            TransactionKind::Transfer,
            vec![TxInput {
                prev_hash: prior_id,
                prev_index: 0,
            }],
            vec![TxOutput {
                asset_id: [7; 32],
                value: Fixed8::from_units(6).unwrap(),
                script_hash: [4; 20],
            }],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&spender, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::IMBALANCED));
    }

    #[test]
    fn pool_conflict_sets_double_spent() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let coin = fund(&ledger, 1, 100, [3; 20]);

        let first = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(100, [4; 20])],
            vec![],
        )
        .unwrap();
        pool.try_admit(Arc::new(first)).unwrap();

        let rival = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(100, [5; 20])],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&rival, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::DOUBLE_SPENT));
    }

    #[test]
    fn ledger_spent_index_sets_double_spent() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let coin = fund(&ledger, 1, 100, [3; 20]);

        let spender = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(100, [4; 20])],
            vec![],
        )
        .unwrap();
        ledger.mark_spent(&spender);

        let flags = verify_transaction(&spender, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::DOUBLE_SPENT));
    }

    #[test]
    fn missing_unspent_index_sets_incapable() {
        let ledger = MemoryLedger::with_capabilities(Capabilities::TRANSACTION_INDEXES);
        let pool = PendingPool::new();
        let coin = fund(&ledger, 1, 100, [3; 20]);

        let spender = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(100, [4; 20])],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&spender, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::INCAPABLE));
        assert!(!flags.contains(VerifyFlags::DOUBLE_SPENT));
    }

    #[test]
    fn unknown_reference_sets_lack_of_information() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();

        let spender = Transaction::new(
            TransactionKind::Transfer,
            vec![TxInput {
                prev_hash: [0xee; 32],
                prev_index: 0,
            }],
            vec![fee_output(100, [4; 20])],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&spender, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::LACK_OF_INFORMATION));
        assert!(!flags.contains(VerifyFlags::DOUBLE_SPENT));
    }

    #[test]
    fn transfer_may_not_issue() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let coin = fund(&ledger, 1, 100, [3; 20]);

        // Outputs exceed inputs in the fee asset.
        let spender = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(150, [4; 20])],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&spender, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::IMBALANCED));
    }

    #[test]
    fn mint_may_issue_only_the_fee_asset() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();

        let good = Transaction::new(
            TransactionKind::Mint { nonce: 1 },
            vec![],
            vec![fee_output(50, [3; 20])],
            vec![],
        )
        .unwrap();
        assert!(verify_transaction(&good, &ledger, &pool).is_ok());

        let bad = Transaction::new(
            TransactionKind::Mint { nonce: 2 },
            vec![],
            vec![TxOutput {
                asset_id: [7; 32],
                value: Fixed8::from_units(50).unwrap(),
                script_hash: [3; 20],
            }],
            vec![],
        )
        .unwrap();
        assert!(verify_transaction(&bad, &ledger, &pool)
            .contains(VerifyFlags::IMBALANCED));
    }

    #[test]
    fn declared_system_fee_must_be_covered() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let (_, public) = keypair(0x11);
        let owner = witness::script_hash_of(&public);
        let (_, issuer_public) = keypair(0x22);
        let issuer = witness::script_hash_of(&issuer_public);

        // Register asset X so the issue transaction's authority set is
        // resolvable.
        let register = Transaction::new(
            TransactionKind::Register(AssetRegistration {
                total_supply: Fixed8::ZERO,
                precision: 8,
                issuer,
                admin: issuer,
            }),
            vec![],
            vec![fee_output(1, [1; 20])],
            vec![],
        )
        .unwrap();
        let asset_id = register.id();
        ledger.insert(register);

        // The issue fee is 5; destroying only 3 units must be flagged.
        let coin = fund(&ledger, 1, 10, owner);
        let issue = Transaction::new(
            TransactionKind::Issue,
            vec![coin],
            vec![
                fee_output(7, owner),
                TxOutput {
                    asset_id,
                    value: Fixed8::from_units(100).unwrap(),
                    script_hash: [9; 20],
                },
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(issue.system_fee(), ISSUE_SYSTEM_FEE);

        let flags = verify_transaction(&issue, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::IMBALANCED));
    }

    #[test]
    fn negative_output_of_native_asset_is_imbalanced() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();

        let tx = Transaction::new(
            TransactionKind::Transfer,
            vec![],
            vec![
                TxOutput {
                    asset_id: FEE_ASSET_ID,
                    value: Fixed8::from_raw(-100),
                    script_hash: [3; 20],
                },
                fee_output(1, [3; 20]),
            ],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&tx, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::IMBALANCED));
    }

    #[test]
    fn negative_output_of_unknown_asset_lacks_information() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();

        let tx = Transaction::new(
            TransactionKind::Transfer,
            vec![],
            vec![
                TxOutput {
                    asset_id: [7; 32],
                    value: Fixed8::from_raw(-100),
                    script_hash: [3; 20],
                },
                TxOutput {
                    asset_id: [7; 32],
                    value: Fixed8::from_raw(100),
                    script_hash: [4; 20],
                },
            ],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&tx, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::LACK_OF_INFORMATION));
    }

    #[test]
    fn negative_output_authority_paths() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let issuer: Hash160 = [7; 20];
        let admin: Hash160 = [8; 20];

        let register_open = Transaction::new(
            TransactionKind::Register(AssetRegistration {
                total_supply: Fixed8::ZERO,
                precision: 8,
                issuer,
                admin,
            }),
            vec![],
            vec![fee_output(1, [1; 20])],
            vec![],
        )
        .unwrap();
        let open_asset = register_open.id();
        ledger.insert(register_open);

        let register_fixed = Transaction::new(
            TransactionKind::Register(AssetRegistration {
                total_supply: Fixed8::from_units(1000).unwrap(),
                precision: 8,
                issuer,
                admin,
            }),
            vec![],
            vec![fee_output(1, [2; 20])],
            vec![],
        )
        .unwrap();
        let fixed_asset = register_fixed.id();
        ledger.insert(register_fixed);

        let adjustment = |asset_id: Hash256, to: Hash160| {
            Transaction::new(
                TransactionKind::Transfer,
                vec![],
                vec![
                    TxOutput {
                        asset_id,
                        value: Fixed8::from_raw(-500),
                        script_hash: to,
                    },
                    TxOutput {
                        asset_id,
                        value: Fixed8::from_raw(500),
                        script_hash: [9; 20],
                    },
                ],
                vec![],
            )
            .unwrap()
        };

        // Open asset, adjustment payable to the admin: clean.
        let ok = verify_transaction(&adjustment(open_asset, admin), &ledger, &pool);
        assert!(ok.is_ok());

        // Fixed-supply asset: never adjustable.
        let fixed = verify_transaction(&adjustment(fixed_asset, admin), &ledger, &pool);
        assert!(fixed.contains(VerifyFlags::IMBALANCED));

        // Open asset but paid to a stranger's script.
        let stranger = verify_transaction(&adjustment(open_asset, [6; 20]), &ledger, &pool);
        assert!(stranger.contains(VerifyFlags::IMBALANCED));
    }

    #[test]
    fn flags_accumulate_across_stages() {
        let ledger = MemoryLedger::new();
        let pool = PendingPool::new();
        let coin = fund(&ledger, 1, 100, [3; 20]);

        // Pool rival takes the same input.
        let rival = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(100, [4; 20])],
            vec![],
        )
        .unwrap();
        pool.try_admit(Arc::new(rival)).unwrap();

        // Candidate both conflicts and issues value without authority,
        // and carries no witness for its referenced input.
        let candidate = Transaction::new(
            TransactionKind::Transfer,
            vec![coin],
            vec![fee_output(200, [5; 20])],
            vec![],
        )
        .unwrap();

        let flags = verify_transaction(&candidate, &ledger, &pool);
        assert!(flags.contains(VerifyFlags::DOUBLE_SPENT));
        assert!(flags.contains(VerifyFlags::IMBALANCED));
        assert!(flags.contains(VerifyFlags::INVALID_SIGNATURE));
        assert!(!flags.is_ok());
    }
}
