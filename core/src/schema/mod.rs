//! Schema & index registry
//!
//! Declares, per table, its fields, the unique primary index and the
//! non-unique secondary indexes. The registry is plain configuration data:
//! it is validated once before the store accepts any transaction and never
//! changes afterwards.

mod validator;

pub use validator::{SchemaError, SchemaValidator};

use serde::{Deserialize, Serialize};

/// Table holding blog posts
pub const POSTS_TABLE: &str = "BlogPost";

/// Table holding comments
pub const COMMENTS_TABLE: &str = "Comments";

/// Index names used by the built-in registry
pub mod index {
    /// Primary index on `ID` (both tables)
    pub const ID: &str = "id";

    /// Post title
    pub const TITLE: &str = "title";

    /// Post body
    pub const ARTICLE_TEXT: &str = "articletext";

    /// Author of a post or comment
    pub const AUTHOR_NAME: &str = "authorname";

    /// Comment foreign key to the owning post
    pub const ARTICLE_ID: &str = "articleid";

    /// Comment body
    pub const COMMENT_TEXT: &str = "commenttext";
}

/// Declaration of a single index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name, unique within its table
    pub name: String,

    /// Field the index is keyed by
    pub field: String,

    /// Whether at most one row may exist per key
    pub unique: bool,
}

impl IndexSchema {
    /// Declare the unique primary index
    pub fn primary(name: &str, field: &str) -> Self {
        IndexSchema {
            name: name.to_string(),
            field: field.to_string(),
            unique: true,
        }
    }

    /// Declare a non-unique secondary index
    pub fn secondary(name: &str, field: &str) -> Self {
        IndexSchema {
            name: name.to_string(),
            field: field.to_string(),
            unique: false,
        }
    }
}

/// Declaration of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,

    /// Field names of the record kind stored in this table
    pub fields: Vec<String>,

    /// All indexes, primary included
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    /// Create a table declaration
    pub fn new(name: &str, fields: &[&str], indexes: Vec<IndexSchema>) -> Self {
        TableSchema {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            indexes,
        }
    }

    /// The unique primary index, if declared
    pub fn primary_index(&self) -> Option<&IndexSchema> {
        self.indexes.iter().find(|idx| idx.unique)
    }

    /// The non-unique secondary indexes in declaration order
    pub fn secondary_indexes(&self) -> impl Iterator<Item = &IndexSchema> {
        self.indexes.iter().filter(|idx| !idx.unique)
    }
}

/// The full registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables in declaration order
    pub tables: Vec<TableSchema>,
}

impl Schema {
    /// Create a registry from table declarations
    pub fn new(tables: Vec<TableSchema>) -> Self {
        Schema { tables }
    }

    /// The registry of the blog backend
    pub fn blog() -> Self {
        Schema::new(vec![
            TableSchema::new(
                POSTS_TABLE,
                &["ID", "Title", "ArticleText", "AuthorName"],
                vec![
                    IndexSchema::primary(index::ID, "ID"),
                    IndexSchema::secondary(index::TITLE, "Title"),
                    IndexSchema::secondary(index::ARTICLE_TEXT, "ArticleText"),
                    IndexSchema::secondary(index::AUTHOR_NAME, "AuthorName"),
                ],
            ),
            TableSchema::new(
                COMMENTS_TABLE,
                &["ID", "ArticleID", "CommentText", "AuthorName"],
                vec![
                    IndexSchema::primary(index::ID, "ID"),
                    IndexSchema::secondary(index::ARTICLE_ID, "ArticleID"),
                    IndexSchema::secondary(index::COMMENT_TEXT, "CommentText"),
                    IndexSchema::secondary(index::AUTHOR_NAME, "AuthorName"),
                ],
            ),
        ])
    }

    /// Validate the registry
    pub fn validate(&self) -> Result<(), SchemaError> {
        SchemaValidator::validate_schema(self)
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}
