//! Ledger collaborator interface and an in-memory implementation

use crate::transaction::{Transaction, TransactionKind};
use crate::types::{AssetRegistration, Hash256, TxInput};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

bitflags::bitflags! {
    /// Queries a ledger backend advertises it can answer.
    ///
    /// The verifier degrades to `LACK_OF_INFORMATION` / `INCAPABLE`
    /// when a needed capability is absent; it never assumes one.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u8 {
        /// Can look up blocks by index or hash.
        const BLOCK_INDEXES       = 0b0001;
        /// Can look up transactions by id.
        const TRANSACTION_INDEXES = 0b0010;
        /// Maintains a spent-output index usable for double-spend checks.
        const UNSPENT_INDEXES     = 0b0100;
        /// Tracks aggregate chain statistics.
        const STATISTICS          = 0b1000;
    }
}

/// Read access to confirmed ledger state.
///
/// Implementations must be safe for concurrent readers; validation never
/// writes through this trait. Callers must not mutate ledger state while
/// a single transaction's validation is in flight against it.
pub trait Ledger: Send + Sync {
    /// Capability bitset of this backend.
    fn capabilities(&self) -> Capabilities;

    /// Fetches a confirmed transaction by id.
    fn transaction(&self, id: &Hash256) -> Option<Arc<Transaction>>;

    /// Whether any of the transaction's spend references is already
    /// spent on the ledger. Only meaningful when
    /// [`Capabilities::UNSPENT_INDEXES`] is advertised.
    fn is_double_spend(&self, tx: &Transaction) -> bool;

    /// Registration record of an asset, keyed by the id of the
    /// transaction that registered it.
    fn asset(&self, id: &Hash256) -> Option<AssetRegistration>;
}

/// HashMap-backed ledger with full capabilities.
///
/// Backs the test suites and gives embedders a reference implementation
/// of the collaborator contract. Registration transactions inserted here
/// automatically create their asset record under the transaction id.
#[derive(Debug)]
pub struct MemoryLedger {
    transactions: RwLock<HashMap<Hash256, Arc<Transaction>>>,
    assets: RwLock<HashMap<Hash256, AssetRegistration>>,
    spent: RwLock<HashSet<TxInput>>,
    capabilities: Capabilities,
}

impl MemoryLedger {
    /// A ledger advertising every capability.
    pub fn new() -> Self {
        MemoryLedger {
            transactions: RwLock::new(HashMap::new()),
            assets: RwLock::new(HashMap::new()),
            spent: RwLock::new(HashSet::new()),
            capabilities: Capabilities::all(),
        }
    }

    /// A ledger restricted to the given capabilities, for exercising the
    /// verifier's degraded paths.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        MemoryLedger {
            capabilities,
            ..MemoryLedger::new()
        }
    }

    /// Stores a confirmed transaction. A registration transaction also
    /// creates its asset record.
    pub fn insert(&self, tx: Transaction) -> Arc<Transaction> {
        let id = tx.id();
        if let TransactionKind::Register(registration) = tx.kind() {
            self.assets.write().insert(id, *registration);
        }
        let tx = Arc::new(tx);
        self.transactions.write().insert(id, Arc::clone(&tx));
        tx
    }

    /// Marks every spend reference of `tx` as spent, as a block commit
    /// would.
    pub fn mark_spent(&self, tx: &Transaction) {
        let mut spent = self.spent.write();
        for input in tx.all_inputs() {
            spent.insert(*input);
        }
    }

    pub fn contains(&self, id: &Hash256) -> bool {
        self.transactions.read().contains_key(id)
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        MemoryLedger::new()
    }
}

impl Ledger for MemoryLedger {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn transaction(&self, id: &Hash256) -> Option<Arc<Transaction>> {
        self.transactions.read().get(id).cloned()
    }

    fn is_double_spend(&self, tx: &Transaction) -> bool {
        let spent = self.spent.read();
        tx.all_inputs().any(|input| spent.contains(input))
    }

    fn asset(&self, id: &Hash256) -> Option<AssetRegistration> {
        self.assets.read().get(id).copied()
    }
}
