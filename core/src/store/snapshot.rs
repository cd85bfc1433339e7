//! Snapshots
//!
//! A snapshot is the complete state of every table at one point in logical
//! time. Published snapshots are never modified; a write transaction works
//! on a fork and hands it back for publication.

use crate::error::Result;
use crate::models::{BlogComment, BlogPost, Record};
use crate::schema::{Schema, SchemaError, SchemaValidator};

use super::table::Table;

/// One table per record kind
#[derive(Debug, Clone)]
pub struct Tables {
    pub(crate) posts: Table<BlogPost>,
    pub(crate) comments: Table<BlogComment>,
}

impl Tables {
    /// Create empty tables, checking each record kind against the registry
    pub fn new(schema: &Schema) -> Result<Self> {
        Ok(Tables {
            posts: empty_table::<BlogPost>(schema)?,
            comments: empty_table::<BlogComment>(schema)?,
        })
    }
}

fn empty_table<R: Record>(schema: &Schema) -> Result<Table<R>> {
    SchemaValidator::validate_record_fields(schema, R::TABLE, R::FIELDS)?;
    let declaration = schema
        .get_table(R::TABLE)
        .ok_or_else(|| SchemaError::MissingTable(R::TABLE.to_string()))?;
    Ok(Table::new(declaration)?)
}

/// A consistent view of all tables
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Number of commits that led to this state; 0 for the empty store
    version: u64,

    /// Table data
    tables: Tables,
}

impl Snapshot {
    /// Create the initial, empty snapshot
    pub(crate) fn empty(schema: &Schema) -> Result<Self> {
        Ok(Snapshot {
            version: 0,
            tables: Tables::new(schema)?,
        })
    }

    /// Commit counter of this snapshot
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The table holding record kind `R`
    pub fn table<R: Record>(&self) -> &Table<R> {
        R::table(&self.tables)
    }

    /// Mutable access for a working copy
    pub(crate) fn table_mut<R: Record>(&mut self) -> &mut Table<R> {
        R::table_mut(&mut self.tables)
    }

    /// A working copy that will become the next version.
    ///
    /// Only table roots are copied; row and index data stay shared until
    /// the working copy modifies them.
    pub(crate) fn fork(&self) -> Snapshot {
        Snapshot {
            version: self.version + 1,
            tables: self.tables.clone(),
        }
    }
}
