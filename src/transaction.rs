//! Transaction entity and its closed set of type variants

use crate::balance;
use crate::codec;
use crate::constants::*;
use crate::error::{FormatError, Result};
use crate::hashing;
use crate::ledger::Ledger;
use crate::references;
use crate::types::*;
use once_cell::sync::OnceCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// The operation a transaction performs, together with its
/// variant-exclusive fields.
///
/// The set of variants is closed: decoding resolves the one-byte
/// discriminant through the match table in [`crate::codec`], never by
/// name lookup. Each variant fixes its system fee, whether it may
/// generate value, whether it is the designated issuance variant, and
/// any pseudo-inputs it contributes to conflict checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// Plain value movement between scripts.
    Transfer,
    /// Value-generation transaction placed first in a block. The nonce
    /// keeps ids of otherwise-identical generation transactions apart.
    Mint { nonce: u32 },
    /// Issues units of a registered asset into circulation. Requires the
    /// asset issuer's signature via the witness stage.
    Issue,
    /// Registers a new asset; the asset id is this transaction's id.
    Register(AssetRegistration),
    /// Spends matured generation rights. The claim references are not
    /// spent as inputs but participate in duplicate and conflict checks.
    Claim { claims: Vec<TxInput> },
}

impl TransactionKind {
    /// One-byte wire discriminant.
    pub fn discriminant(&self) -> u8 {
        match self {
            TransactionKind::Transfer => 0x00,
            TransactionKind::Mint { .. } => 0x01,
            TransactionKind::Issue => 0x02,
            TransactionKind::Register(_) => 0x03,
            TransactionKind::Claim { .. } => 0x04,
        }
    }

    /// Fee this variant must destroy in the fee asset, zero by default.
    pub fn system_fee(&self) -> Fixed8 {
        match self {
            TransactionKind::Register(_) => REGISTER_SYSTEM_FEE,
            TransactionKind::Issue => ISSUE_SYSTEM_FEE,
            _ => Fixed8::ZERO,
        }
    }

    /// Whether this variant may net-issue the fee asset: block
    /// generation, and the claiming of matured generation rights.
    pub fn is_generation(&self) -> bool {
        matches!(
            self,
            TransactionKind::Mint { .. } | TransactionKind::Claim { .. }
        )
    }

    /// Whether this is the designated issuance variant, permitted to
    /// net-issue registered assets.
    pub fn is_issuance(&self) -> bool {
        matches!(self, TransactionKind::Issue)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionKind::Transfer => "Transfer",
            TransactionKind::Mint { .. } => "Mint",
            TransactionKind::Issue => "Issue",
            TransactionKind::Register(_) => "Register",
            TransactionKind::Claim { .. } => "Claim",
        };
        write!(f, "{}", name)
    }
}

/// A validated, immutable ledger transaction.
///
/// Instances come from [`Transaction::decode`] or [`Transaction::new`];
/// both enforce the structural invariants (no duplicate inputs, no
/// zero-value outputs, size limits). There is no mutation after
/// construction, which is what makes the memoized id and reference view
/// sound.
#[derive(Debug, Clone)]
pub struct Transaction {
    kind: TransactionKind,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    witnesses: Vec<Vec<u8>>,
    /// Content id, computed from the unsigned encoding on first access.
    id: OnceCell<Hash256>,
    /// Resolved input->output view, memoized only on success.
    references: OnceCell<HashMap<TxInput, TxOutput>>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.witnesses == other.witnesses
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// Builds a transaction, enforcing the same structural invariants as
    /// the decoder.
    pub fn new(
        kind: TransactionKind,
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
        witnesses: Vec<Vec<u8>>,
    ) -> Result<Self> {
        if inputs.len() > MAX_TX_INPUTS {
            return Err(FormatError::TooManyInputs(inputs.len() as u64));
        }
        if outputs.len() > MAX_TX_OUTPUTS {
            return Err(FormatError::TooManyOutputs(outputs.len() as u64));
        }
        if witnesses.len() > MAX_WITNESS_SCRIPTS {
            return Err(FormatError::TooManyWitnesses(witnesses.len() as u64));
        }
        if let Some(w) = witnesses.iter().find(|w| w.len() > MAX_WITNESS_SIZE) {
            return Err(FormatError::OversizedWitness(w.len() as u64));
        }
        check_no_duplicates(&inputs)?;
        if let TransactionKind::Claim { claims } = &kind {
            if claims.len() > MAX_TX_CLAIMS {
                return Err(FormatError::TooManyInputs(claims.len() as u64));
            }
            check_no_duplicates(claims)?;
        }
        if let Some(i) = outputs.iter().position(|o| o.value.is_zero()) {
            return Err(FormatError::ZeroValueOutput(i));
        }

        Ok(Transaction {
            kind,
            inputs,
            outputs,
            witnesses,
            id: OnceCell::new(),
            references: OnceCell::new(),
        })
    }

    /// Decodes a transaction from its full wire encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        codec::decode_transaction(bytes)
    }

    /// Full wire encoding, including witness scripts.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode_transaction(self)
    }

    /// Unsigned encoding: the shared prefix that stops after outputs.
    /// This is what the id and every witness signature cover.
    pub fn encode_unsigned(&self) -> Vec<u8> {
        codec::encode_transaction_unsigned(self)
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn witnesses(&self) -> &[Vec<u8>] {
        &self.witnesses
    }

    /// Content id: double SHA-256 over the unsigned encoding, computed
    /// once and cached.
    pub fn id(&self) -> Hash256 {
        *self.id.get_or_init(|| hashing::tx_id(self))
    }

    /// The 256-bit digest every witness signature must cover.
    pub fn signing_payload(&self) -> Hash256 {
        hashing::signing_payload(self)
    }

    /// System fee declared by this transaction's variant.
    pub fn system_fee(&self) -> Fixed8 {
        self.kind.system_fee()
    }

    /// All spend references that participate in duplicate and conflict
    /// checks: the plain inputs plus any variant pseudo-inputs.
    pub fn all_inputs(&self) -> impl Iterator<Item = &TxInput> {
        let claims = match &self.kind {
            TransactionKind::Claim { claims } => claims.as_slice(),
            _ => &[],
        };
        self.inputs.iter().chain(claims.iter())
    }

    /// Resolves each input to the output it spends.
    ///
    /// Returns `None` when any referenced transaction is unknown to the
    /// ledger; partial views are never produced. A successful resolution
    /// is memoized for the lifetime of this instance — the ledger view
    /// is assumed stable for the duration of a validation pass. A failed
    /// resolution is not memoized, so a later pass against a more
    /// complete ledger may succeed.
    pub fn references(&self, ledger: &dyn Ledger) -> Option<&HashMap<TxInput, TxOutput>> {
        if let Some(refs) = self.references.get() {
            return Some(refs);
        }
        let resolved = references::resolve(self, ledger)?;
        Some(self.references.get_or_init(|| resolved))
    }

    /// Per-asset net value changes, sorted by asset id.
    ///
    /// `None` when references cannot be resolved or a net sum is not
    /// representable.
    pub fn results(&self, ledger: &dyn Ledger) -> Option<Vec<TransactionResult>> {
        let refs = self.references(ledger)?;
        balance::compute_results(self, refs)
    }

    /// Distinct script hashes whose signatures this transaction needs,
    /// sorted ascending.
    ///
    /// The base set is the script hashes of all referenced outputs.
    /// Claim transactions additionally need the owners of their claimed
    /// outputs; issuance transactions additionally need the issuer of
    /// every asset they net-issue. `None` when the ledger is missing any
    /// of the data required to decide.
    pub fn required_script_hashes(&self, ledger: &dyn Ledger) -> Option<Vec<Hash160>> {
        let refs = self.references(ledger)?;
        let mut hashes: BTreeSet<Hash160> = refs.values().map(|o| o.script_hash).collect();

        match &self.kind {
            TransactionKind::Claim { claims } => {
                let claimed = references::resolve_inputs(claims.iter(), ledger)?;
                hashes.extend(claimed.values().map(|o| o.script_hash));
            }
            TransactionKind::Issue => {
                let results = balance::compute_results(self, refs)?;
                for result in results.iter().filter(|r| r.amount.is_negative()) {
                    let registration = ledger.asset(&result.asset_id)?;
                    hashes.insert(registration.issuer);
                }
            }
            _ => {}
        }

        Some(hashes.into_iter().collect())
    }
}

fn check_no_duplicates(inputs: &[TxInput]) -> Result<()> {
    let mut seen = HashSet::with_capacity(inputs.len());
    for input in inputs {
        if !seen.insert(input) {
            return Err(FormatError::DuplicateInput {
                prev_hash: hex::encode(input.prev_hash),
                prev_index: input.prev_index,
            });
        }
    }
    Ok(())
}
