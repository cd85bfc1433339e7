//! Schema validation
//!
//! Structural checks run once at startup. A failure here is fatal: the
//! store refuses to start rather than serve with a broken registry.

use std::collections::HashSet;
use thiserror::Error;

use super::{Schema, TableSchema};

/// Schema validation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Table has no unique index
    #[error("Table {0} has no primary key")]
    NoPrimaryKey(String),

    /// Table declares more than one unique index
    #[error("Table {0} declares more than one unique index")]
    MultiplePrimaryKeys(String),

    /// Two indexes on one table share a name
    #[error("Index {1} is declared twice on table {0}")]
    DuplicateIndex(String, String),

    /// Index keyed by a field the record kind does not have
    #[error("Index {1} on table {0} refers to unknown field {2}")]
    UnknownField(String, String, String),

    /// A field is listed twice
    #[error("Field {1} is declared twice on table {0}")]
    DuplicateField(String, String),

    /// Two tables share a name
    #[error("Table {0} is declared twice")]
    DuplicateTable(String),

    /// A record kind has no table in the registry
    #[error("Table {0} is missing from the schema")]
    MissingTable(String),

    /// The declared fields differ from the record kind's fields
    #[error("Fields of table {0} do not match its record type: declared {1:?}, record has {2:?}")]
    FieldMismatch(String, Vec<String>, Vec<String>),
}

/// Schema validator
#[derive(Debug, Clone)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validate a single table declaration
    pub fn validate_table(table: &TableSchema) -> Result<(), SchemaError> {
        // Check for duplicate field names
        let mut field_names = HashSet::new();
        for field in &table.fields {
            if !field_names.insert(field.as_str()) {
                return Err(SchemaError::DuplicateField(table.name.clone(), field.clone()));
            }
        }

        // Exactly one unique index
        match table.indexes.iter().filter(|idx| idx.unique).count() {
            0 => return Err(SchemaError::NoPrimaryKey(table.name.clone())),
            1 => {}
            _ => return Err(SchemaError::MultiplePrimaryKeys(table.name.clone())),
        }

        let mut index_names = HashSet::new();
        for idx in &table.indexes {
            if !index_names.insert(idx.name.as_str()) {
                return Err(SchemaError::DuplicateIndex(table.name.clone(), idx.name.clone()));
            }

            if !field_names.contains(idx.field.as_str()) {
                return Err(SchemaError::UnknownField(
                    table.name.clone(),
                    idx.name.clone(),
                    idx.field.clone(),
                ));
            }
        }

        Ok(())
    }

    /// Validate the whole registry
    pub fn validate_schema(schema: &Schema) -> Result<(), SchemaError> {
        let mut table_names = HashSet::new();
        for table in &schema.tables {
            if !table_names.insert(table.name.as_str()) {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
            Self::validate_table(table)?;
        }

        Ok(())
    }

    /// Check that a table declaration describes a record kind with `fields`
    pub fn validate_record_fields(
        schema: &Schema,
        table: &str,
        fields: &[&str],
    ) -> Result<(), SchemaError> {
        let declared = schema
            .get_table(table)
            .ok_or_else(|| SchemaError::MissingTable(table.to_string()))?;

        let mut expected: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let mut actual = declared.fields.clone();
        expected.sort();
        actual.sort();

        if expected != actual {
            return Err(SchemaError::FieldMismatch(table.to_string(), declared.fields.clone(), expected));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IndexSchema;
    use rstest::rstest;

    fn posts(indexes: Vec<IndexSchema>) -> TableSchema {
        TableSchema::new("BlogPost", &["ID", "Title", "AuthorName"], indexes)
    }

    #[rstest]
    #[case::no_primary(
        posts(vec![IndexSchema::secondary("title", "Title")]),
        SchemaError::NoPrimaryKey("BlogPost".to_string())
    )]
    #[case::two_primaries(
        posts(vec![IndexSchema::primary("id", "ID"), IndexSchema::primary("title", "Title")]),
        SchemaError::MultiplePrimaryKeys("BlogPost".to_string())
    )]
    #[case::duplicate_index_name(
        posts(vec![
            IndexSchema::primary("id", "ID"),
            IndexSchema::secondary("author", "AuthorName"),
            IndexSchema::secondary("author", "Title"),
        ]),
        SchemaError::DuplicateIndex("BlogPost".to_string(), "author".to_string())
    )]
    #[case::unknown_field(
        posts(vec![IndexSchema::primary("id", "ID"), IndexSchema::secondary("body", "ArticleText")]),
        SchemaError::UnknownField("BlogPost".to_string(), "body".to_string(), "ArticleText".to_string())
    )]
    #[case::unknown_primary_field(
        posts(vec![IndexSchema::primary("id", "Id")]),
        SchemaError::UnknownField("BlogPost".to_string(), "id".to_string(), "Id".to_string())
    )]
    fn test_invalid_tables(#[case] table: TableSchema, #[case] expected: SchemaError) {
        assert_eq!(SchemaValidator::validate_table(&table), Err(expected));
    }

    #[test]
    fn test_duplicate_field() {
        let table = TableSchema::new("BlogPost", &["ID", "ID"], vec![IndexSchema::primary("id", "ID")]);
        assert_eq!(
            SchemaValidator::validate_table(&table),
            Err(SchemaError::DuplicateField("BlogPost".to_string(), "ID".to_string()))
        );
    }

    #[test]
    fn test_duplicate_table() {
        let table = posts(vec![IndexSchema::primary("id", "ID")]);
        let schema = Schema::new(vec![table.clone(), table]);
        assert_eq!(
            SchemaValidator::validate_schema(&schema),
            Err(SchemaError::DuplicateTable("BlogPost".to_string()))
        );
    }

    #[test]
    fn test_record_fields() {
        let schema = Schema::new(vec![posts(vec![IndexSchema::primary("id", "ID")])]);

        // Order of declaration does not matter
        assert!(SchemaValidator::validate_record_fields(&schema, "BlogPost", &["Title", "ID", "AuthorName"]).is_ok());

        assert!(matches!(
            SchemaValidator::validate_record_fields(&schema, "BlogPost", &["ID", "Title"]),
            Err(SchemaError::FieldMismatch(..))
        ));
        assert_eq!(
            SchemaValidator::validate_record_fields(&schema, "Comments", &["ID"]),
            Err(SchemaError::MissingTable("Comments".to_string()))
        );
    }
}
