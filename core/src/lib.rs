//! # Blog Store Core
//!
//! In-memory transactional record store behind the blog backend.
//! This crate provides the schema registry, the snapshot store, the
//! transaction manager and the blog operations built on top of them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod blog;
pub mod error;
pub mod ids;
pub mod models;
pub mod schema;
pub mod store;
pub mod txn;

/// Re-export common types for ease of use
pub use blog::BlogStore;
pub use error::{Result, StoreError};
pub use ids::{IdGenerator, SequentialIds, TimeOrderedIds};
pub use models::{BlogComment, BlogPost, CommentFields, PostFields, Record};
pub use schema::{Schema, SchemaError};
pub use store::{Snapshot, Store};
pub use txn::{ReadTxn, Txn, WriteTxn};
