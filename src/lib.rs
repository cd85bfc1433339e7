//! Blog Store - blog posts and comments over an in-memory transactional store
//!
//! This is the root crate that provides workspace-level documentation.
//! The implementation lives in the subcrates:
//! - `blogstore-core`: schema registry, snapshot store, transactions and blog operations
//! - `blogstore-server`: HTTP service

pub use blogstore_core as store;

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
