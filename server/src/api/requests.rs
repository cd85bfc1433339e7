//! Request bodies and their validation

use serde::Deserialize;

use blogstore_core::{CommentFields, PostFields};

use crate::error::ApiError;

/// Body of `POST /blog`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPostRequest {
    /// Must be empty; ids are assigned by the server
    #[serde(rename = "ID", default)]
    pub id: String,

    /// Post title
    #[serde(rename = "Title", default)]
    pub title: String,

    /// Body text
    #[serde(rename = "ArticleText", default)]
    pub article_text: String,

    /// Author
    #[serde(rename = "AuthorName", default)]
    pub author_name: String,
}

/// Body of `POST /blog/:id/comments`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCommentRequest {
    /// Must be empty; ids are assigned by the server
    #[serde(rename = "ID", default)]
    pub id: String,

    /// Optional; if given it must name the post in the path
    #[serde(rename = "ArticleID", default)]
    pub article_id: String,

    /// Comment body
    #[serde(rename = "CommentText", default)]
    pub comment_text: String,

    /// Author
    #[serde(rename = "AuthorName", default)]
    pub author_name: String,
}

fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{} should not be empty", field)));
    }
    Ok(())
}

impl NewPostRequest {
    /// Check the request and extract the post content
    pub fn validate(self) -> Result<PostFields, ApiError> {
        require(&self.title, "Title")?;
        require(&self.article_text, "ArticleText")?;
        require(&self.author_name, "AuthorName")?;
        if !self.id.is_empty() {
            return Err(ApiError::Validation(
                "ID should not be defined in new post requests".to_string(),
            ));
        }

        Ok(PostFields {
            title: self.title,
            article_text: self.article_text,
            author_name: self.author_name,
        })
    }
}

impl NewCommentRequest {
    /// Check the request against the post in the path and extract the comment content
    pub fn validate(self, post_id: &str) -> Result<CommentFields, ApiError> {
        require(&self.comment_text, "CommentText")?;
        require(&self.author_name, "AuthorName")?;
        if !self.id.is_empty() {
            return Err(ApiError::Validation(
                "ID should not be defined in new comment requests".to_string(),
            ));
        }
        if !self.article_id.is_empty() && self.article_id != post_id {
            return Err(ApiError::Validation(
                "ArticleID does not match the post in the request path".to_string(),
            ));
        }

        Ok(CommentFields {
            comment_text: self.comment_text,
            author_name: self.author_name,
        })
    }
}
