//! Snapshot store
//!
//! Owns the current published snapshot. The pointer to it is the only
//! shared mutable state in the store, and [`Store::publish`] is the only code
//! path that changes it. Transactions (see [`crate::txn`]) are the sole way
//! callers reach the data.

mod pmap;
mod snapshot;
mod table;

pub use pmap::PersistentMap;
pub use snapshot::{Snapshot, Tables};
pub use table::Table;

use std::sync::{Arc, PoisonError, RwLock};
use log::debug;

use crate::error::Result;
use crate::schema::Schema;
use crate::txn::WriterGate;

/// The in-memory transactional record store
#[derive(Debug)]
pub struct Store {
    /// Validated registry
    schema: Arc<Schema>,

    /// Current published snapshot
    current: RwLock<Arc<Snapshot>>,

    /// Serializes write transactions
    pub(crate) writer: WriterGate,
}

impl Store {
    /// Create an empty store, failing if the schema is invalid
    pub fn new(schema: Schema) -> Result<Self> {
        schema.validate()?;
        let snapshot = Snapshot::empty(&schema)?;

        debug!("Created store with {} tables", schema.tables.len());

        Ok(Store {
            schema: Arc::new(schema),
            current: RwLock::new(Arc::new(snapshot)),
            writer: WriterGate::new(),
        })
    }

    /// Create an empty store with the blog registry
    pub fn blog() -> Result<Self> {
        Self::new(Schema::blog())
    }

    /// The registry this store was built from
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The live snapshot
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        // The lock only guards a pointer swap, so a poisoned lock still holds
        // a complete snapshot
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A working copy of the current snapshot.
    ///
    /// Callers must hold the writer slot, otherwise two working copies of
    /// the same version could be published.
    pub(crate) fn fork(&self) -> Snapshot {
        self.current_snapshot().fork()
    }

    /// Make `working` the current snapshot
    pub(crate) fn publish(&self, working: Snapshot) {
        let version = working.version();
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(working);
        debug!("Published snapshot version {}", version);
    }
}
