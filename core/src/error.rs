//! Error types for the core crate
//!
//! Every failure the store can report is a distinct variant so callers can
//! map them to outcomes (missing resource, client error, retry) without
//! string matching.

use thiserror::Error;

use crate::schema::SchemaError;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The schema registry is invalid or does not match the record kinds
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The referenced row does not exist
    #[error("No row with key {key} in table {table}")]
    NotFound {
        /// Table that was searched
        table: String,
        /// Key that was looked up
        key: String,
    },

    /// A row with the same primary key is already present
    #[error("Duplicate primary key {key} in table {table}")]
    DuplicateKey {
        /// Table the insert targeted
        table: String,
        /// The conflicting primary key
        key: String,
    },

    /// Lookup through an index that is not registered for the table
    #[error("Unknown index {index} on table {table}")]
    UnknownIndex {
        /// Table that was queried
        table: String,
        /// Index name that was requested
        index: String,
    },

    /// A dependent row references a parent that does not exist
    #[error("Foreign key violation: no row with key {key} in table {table}")]
    ForeignKeyViolation {
        /// The parent table
        table: String,
        /// The missing parent key
        key: String,
    },

    /// Another write transaction is open
    #[error("Another write transaction is in progress")]
    WriterBusy,

    /// The transaction was already committed or aborted
    #[error("Transaction already terminated")]
    AlreadyTerminated,
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Build a `NotFound` error
    pub fn not_found(table: &str, key: &str) -> Self {
        StoreError::NotFound {
            table: table.to_string(),
            key: key.to_string(),
        }
    }

    /// Build a `ForeignKeyViolation` error
    pub fn foreign_key(table: &str, key: &str) -> Self {
        StoreError::ForeignKeyViolation {
            table: table.to_string(),
            key: key.to_string(),
        }
    }

    /// Whether this error means the referenced row is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::WriterBusy)
    }
}
