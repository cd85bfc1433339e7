//! Blog post record

use serde::{Deserialize, Serialize};

use super::row::Record;
use crate::schema::POSTS_TABLE;
use crate::store::{Table, Tables};

/// A single blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    /// Unique post identifier
    #[serde(rename = "ID")]
    pub id: String,

    /// Post title
    #[serde(rename = "Title")]
    pub title: String,

    /// Body text
    #[serde(rename = "ArticleText")]
    pub article_text: String,

    /// Author
    #[serde(rename = "AuthorName")]
    pub author_name: String,
}

/// Caller-supplied content of a new post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFields {
    /// Post title
    #[serde(rename = "Title")]
    pub title: String,

    /// Body text
    #[serde(rename = "ArticleText")]
    pub article_text: String,

    /// Author
    #[serde(rename = "AuthorName")]
    pub author_name: String,
}

impl BlogPost {
    /// Build a post from its id and content
    pub fn new(id: String, fields: PostFields) -> Self {
        BlogPost {
            id,
            title: fields.title,
            article_text: fields.article_text,
            author_name: fields.author_name,
        }
    }
}

impl Record for BlogPost {
    const TABLE: &'static str = POSTS_TABLE;
    const FIELDS: &'static [&'static str] = &["ID", "Title", "ArticleText", "AuthorName"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "ID" => Some(&self.id),
            "Title" => Some(&self.title),
            "ArticleText" => Some(&self.article_text),
            "AuthorName" => Some(&self.author_name),
            _ => None,
        }
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.posts
    }
}
