//! Typed rows
//!
//! Each table stores exactly one record kind, fixed at compile time. The
//! [`Record`] trait ties a Rust type to its table name, its field list and
//! its slot in the snapshot, so lookups hand back the concrete type without
//! any runtime cast.

use std::fmt::Debug;

use crate::store::{Table, Tables};

/// A record kind stored in one table
pub trait Record: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Name of the table holding this record kind
    const TABLE: &'static str;

    /// Field names, as declared in the schema
    const FIELDS: &'static [&'static str];

    /// Value of a named field, `None` if the record has no such field
    fn field(&self, name: &str) -> Option<&str>;

    /// This record kind's table in a snapshot
    fn table(tables: &Tables) -> &Table<Self>;

    /// This record kind's table in a working copy
    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;
}
