//! Table storage
//!
//! A table holds one record kind under its primary index and keeps every
//! secondary index in lock-step with it. All index keys for a row are
//! computed before anything is modified, so a failed insert or delete never
//! leaves a table with some indexes updated and others not.

use std::sync::Arc;

use super::pmap::PersistentMap;
use crate::error::{Result, StoreError};
use crate::models::Record;
use crate::schema::{SchemaError, TableSchema};

/// Secondary index key: the indexed field value, then the primary key.
/// Rows sharing a field value are therefore ordered by primary key.
type IndexKey = (String, String);

/// A non-unique index over one field
#[derive(Debug, Clone)]
struct SecondaryIndex<R> {
    name: String,
    field: String,
    entries: PersistentMap<IndexKey, Arc<R>>,
}

/// State of one table in a snapshot
#[derive(Debug, Clone)]
pub struct Table<R> {
    /// Table name
    name: String,

    /// Name of the unique primary index
    primary_index: String,

    /// Field the primary index is keyed by
    primary_field: String,

    /// Rows keyed by primary key
    rows: PersistentMap<String, Arc<R>>,

    /// Secondary indexes in declaration order
    secondary: Vec<SecondaryIndex<R>>,
}

impl<R: Record> Table<R> {
    /// Create an empty table from its declaration
    pub fn new(schema: &TableSchema) -> std::result::Result<Self, SchemaError> {
        let primary = schema
            .primary_index()
            .ok_or_else(|| SchemaError::NoPrimaryKey(schema.name.clone()))?;

        let secondary = schema
            .secondary_indexes()
            .map(|idx| SecondaryIndex {
                name: idx.name.clone(),
                field: idx.field.clone(),
                entries: PersistentMap::new(),
            })
            .collect();

        Ok(Table {
            name: schema.name.clone(),
            primary_index: primary.name.clone(),
            primary_field: primary.field.clone(),
            rows: PersistentMap::new(),
            secondary,
        })
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Names of all indexes, primary first
    pub fn index_names(&self) -> Vec<&str> {
        std::iter::once(self.primary_index.as_str())
            .chain(self.secondary.iter().map(|idx| idx.name.as_str()))
            .collect()
    }

    /// All rows whose `index` field equals `key`, in index order
    pub fn get(&self, index: &str, key: &str) -> Result<Vec<Arc<R>>> {
        if index == self.primary_index {
            return Ok(self.rows.get(&key.to_string()).cloned().into_iter().collect());
        }

        let idx = self.secondary_index(index)?;
        let start = (key.to_string(), String::new());
        Ok(idx
            .entries
            .range_from(&start)
            .take_while(|((value, _), _)| value == key)
            .map(|(_, row)| row.clone())
            .collect())
    }

    /// The first row whose `index` field equals `key`
    pub fn first(&self, index: &str, key: &str) -> Result<Option<Arc<R>>> {
        if index == self.primary_index {
            return Ok(self.rows.get(&key.to_string()).cloned());
        }

        let idx = self.secondary_index(index)?;
        let start = (key.to_string(), String::new());
        Ok(idx
            .entries
            .range_from(&start)
            .next()
            .filter(|((value, _), _)| value == key)
            .map(|(_, row)| row.clone()))
    }

    /// Every row, in the order of `index`
    pub fn scan(&self, index: &str) -> Result<Vec<Arc<R>>> {
        if index == self.primary_index {
            return Ok(self.rows.iter().map(|(_, row)| row.clone()).collect());
        }

        let idx = self.secondary_index(index)?;
        Ok(idx.entries.iter().map(|(_, row)| row.clone()).collect())
    }

    /// Insert a new row into the table and all of its indexes
    pub fn insert(&mut self, row: R) -> Result<Arc<R>> {
        let key = self.primary_key(&row)?.to_string();
        if self.rows.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                table: self.name.clone(),
                key,
            });
        }

        let index_keys = self.index_keys(&row, &key)?;
        let row = Arc::new(row);

        self.rows.insert(key, row.clone());
        for (idx, index_key) in self.secondary.iter_mut().zip(index_keys) {
            idx.entries.insert(index_key, row.clone());
        }

        Ok(row)
    }

    /// Remove the row with the same primary key as `row` from the table and
    /// all of its indexes
    pub fn delete(&mut self, row: &R) -> Result<Arc<R>> {
        let key = self.primary_key(row)?.to_string();

        // Index entries are located through the stored row, not the caller's copy
        let stored = self
            .rows
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(&self.name, &key))?;
        let index_keys = self.index_keys(&stored, &key)?;

        self.rows.remove(&key);
        for (idx, index_key) in self.secondary.iter_mut().zip(index_keys) {
            idx.entries.remove(&index_key);
        }

        Ok(stored)
    }

    /// Whether all indexes hold exactly the rows of the primary index
    pub fn indexes_consistent(&self) -> bool {
        self.secondary.iter().all(|idx| {
            idx.entries.len() == self.rows.len()
                && idx.entries.iter().all(|((value, key), row)| {
                    self.rows.get(key).map_or(false, |stored| Arc::ptr_eq(stored, row))
                        && row.field(&idx.field) == Some(value.as_str())
                })
        })
    }

    fn primary_key<'r>(&self, row: &'r R) -> Result<&'r str> {
        row.field(&self.primary_field).ok_or_else(|| {
            SchemaError::UnknownField(
                self.name.clone(),
                self.primary_index.clone(),
                self.primary_field.clone(),
            )
            .into()
        })
    }

    fn index_keys(&self, row: &R, key: &str) -> Result<Vec<IndexKey>> {
        self.secondary
            .iter()
            .map(|idx| {
                let value = row.field(&idx.field).ok_or_else(|| {
                    StoreError::from(SchemaError::UnknownField(
                        self.name.clone(),
                        idx.name.clone(),
                        idx.field.clone(),
                    ))
                })?;
                Ok((value.to_string(), key.to_string()))
            })
            .collect()
    }

    fn secondary_index(&self, index: &str) -> Result<&SecondaryIndex<R>> {
        self.secondary
            .iter()
            .find(|idx| idx.name == index)
            .ok_or_else(|| StoreError::UnknownIndex {
                table: self.name.clone(),
                index: index.to_string(),
            })
    }
}
