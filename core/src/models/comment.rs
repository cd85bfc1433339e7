//! Comment record

use serde::{Deserialize, Serialize};

use super::row::Record;
use crate::schema::COMMENTS_TABLE;
use crate::store::{Table, Tables};

/// A comment on a [`BlogPost`](super::BlogPost)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogComment {
    /// Unique comment identifier
    #[serde(rename = "ID")]
    pub id: String,

    /// Id of the post this comment belongs to
    #[serde(rename = "ArticleID")]
    pub article_id: String,

    /// Comment body
    #[serde(rename = "CommentText")]
    pub comment_text: String,

    /// Author
    #[serde(rename = "AuthorName")]
    pub author_name: String,
}

/// Caller-supplied content of a new comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentFields {
    /// Comment body
    #[serde(rename = "CommentText")]
    pub comment_text: String,

    /// Author
    #[serde(rename = "AuthorName")]
    pub author_name: String,
}

impl BlogComment {
    /// Build a comment from its id, owning post and content
    pub fn new(id: String, article_id: String, fields: CommentFields) -> Self {
        BlogComment {
            id,
            article_id,
            comment_text: fields.comment_text,
            author_name: fields.author_name,
        }
    }
}

impl Record for BlogComment {
    const TABLE: &'static str = COMMENTS_TABLE;
    const FIELDS: &'static [&'static str] = &["ID", "ArticleID", "CommentText", "AuthorName"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "ID" => Some(&self.id),
            "ArticleID" => Some(&self.article_id),
            "CommentText" => Some(&self.comment_text),
            "AuthorName" => Some(&self.author_name),
            _ => None,
        }
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.comments
    }
}
