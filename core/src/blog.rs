//! Blog operations
//!
//! Posts and comments on top of the transactional store. Each operation runs
//! as exactly one transaction, so its effects are either fully visible or
//! not at all.

use std::sync::Arc;
use log::debug;

use crate::error::{Result, StoreError};
use crate::ids::{IdGenerator, TimeOrderedIds};
use crate::models::{BlogComment, BlogPost, CommentFields, PostFields};
use crate::schema::{index, COMMENTS_TABLE, POSTS_TABLE};
use crate::store::Store;
use crate::txn::Txn;

/// Posts and their comments
pub struct BlogStore {
    store: Store,
    post_ids: Arc<dyn IdGenerator>,
    comment_ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for BlogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlogStore").field("store", &self.store).finish_non_exhaustive()
    }
}

fn post_exists(txn: &impl Txn, post_id: &str) -> Result<bool> {
    Ok(txn.first::<BlogPost>(index::ID, post_id)?.is_some())
}

impl BlogStore {
    /// Create an empty blog with time-ordered ids
    pub fn new() -> Result<Self> {
        Self::with_ids(TimeOrderedIds, TimeOrderedIds)
    }

    /// Create an empty blog drawing post and comment ids from the given generators
    pub fn with_ids(
        post_ids: impl IdGenerator + 'static,
        comment_ids: impl IdGenerator + 'static,
    ) -> Result<Self> {
        Ok(BlogStore {
            store: Store::blog()?,
            post_ids: Arc::new(post_ids),
            comment_ids: Arc::new(comment_ids),
        })
    }

    /// The underlying record store
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Store a new post and return its id
    pub fn create_post(&self, fields: PostFields) -> Result<String> {
        let id = self.post_ids.next_id();
        self.store.update(|txn| {
            txn.insert(BlogPost::new(id.clone(), fields))?;
            Ok(())
        })?;

        debug!("Created post {}", id);
        Ok(id)
    }

    /// Ids of all posts in primary key order
    pub fn list_post_ids(&self) -> Result<Vec<String>> {
        self.store.view(|txn| {
            let posts = txn.scan::<BlogPost>(index::ID)?;
            Ok(posts.iter().map(|post| post.id.clone()).collect())
        })
    }

    /// Fetch one post
    pub fn get_post(&self, id: &str) -> Result<BlogPost> {
        self.store.view(|txn| {
            txn.first::<BlogPost>(index::ID, id)?
                .map(|post| (*post).clone())
                .ok_or_else(|| StoreError::not_found(POSTS_TABLE, id))
        })
    }

    /// Delete a post together with all of its comments.
    ///
    /// Returns the number of comments removed. Nothing is published unless
    /// every delete succeeds.
    pub fn delete_post(&self, id: &str) -> Result<usize> {
        let removed = self.store.update(|txn| {
            let post = txn
                .first::<BlogPost>(index::ID, id)?
                .ok_or_else(|| StoreError::not_found(POSTS_TABLE, id))?;
            txn.delete(&*post)?;

            let comments = txn.get::<BlogComment>(index::ARTICLE_ID, id)?;
            for comment in &comments {
                txn.delete(&**comment)?;
            }
            Ok(comments.len())
        })?;

        debug!("Deleted post {} and {} comments", id, removed);
        Ok(removed)
    }

    /// Store a new comment under `post_id` and return its id
    pub fn create_comment(&self, post_id: &str, fields: CommentFields) -> Result<String> {
        let id = self.comment_ids.next_id();
        self.store.update(|txn| {
            // Checked in the same transaction as the insert, so the post
            // cannot disappear in between
            if !post_exists(&*txn, post_id)? {
                return Err(StoreError::foreign_key(POSTS_TABLE, post_id));
            }
            txn.insert(BlogComment::new(id.clone(), post_id.to_string(), fields))?;
            Ok(())
        })?;

        debug!("Created comment {} on post {}", id, post_id);
        Ok(id)
    }

    /// Ids of all comments on a post, in primary key order
    pub fn list_comment_ids(&self, post_id: &str) -> Result<Vec<String>> {
        self.store.view(|txn| {
            if !post_exists(txn, post_id)? {
                return Err(StoreError::not_found(POSTS_TABLE, post_id));
            }
            let comments = txn.get::<BlogComment>(index::ARTICLE_ID, post_id)?;
            Ok(comments.iter().map(|comment| comment.id.clone()).collect())
        })
    }

    /// Fetch one comment of a post
    pub fn get_comment(&self, post_id: &str, id: &str) -> Result<BlogComment> {
        self.store.view(|txn| {
            let comment = find_comment(txn, post_id, id)?;
            Ok((*comment).clone())
        })
    }

    /// Delete one comment of a post
    pub fn delete_comment(&self, post_id: &str, id: &str) -> Result<()> {
        self.store.update(|txn| {
            let comment = find_comment(&*txn, post_id, id)?;
            txn.delete(&*comment)?;
            Ok(())
        })?;

        debug!("Deleted comment {} on post {}", id, post_id);
        Ok(())
    }

    /// Ids of comments whose post is missing from the current snapshot.
    ///
    /// Always empty unless referential integrity has been broken.
    pub fn check_integrity(&self) -> Result<Vec<String>> {
        self.store.view(|txn| {
            let mut orphans = Vec::new();
            for comment in txn.scan::<BlogComment>(index::ID)? {
                if !post_exists(txn, &comment.article_id)? {
                    orphans.push(comment.id.clone());
                }
            }
            Ok(orphans)
        })
    }

    /// Version of the current snapshot
    pub fn version(&self) -> u64 {
        self.store.current_snapshot().version()
    }
}

/// A comment that exists and belongs to `post_id`
fn find_comment(txn: &impl Txn, post_id: &str, id: &str) -> Result<Arc<BlogComment>> {
    if !post_exists(txn, post_id)? {
        return Err(StoreError::not_found(POSTS_TABLE, post_id));
    }

    txn.first::<BlogComment>(index::ID, id)?
        .filter(|comment| comment.article_id == post_id)
        .ok_or_else(|| StoreError::not_found(COMMENTS_TABLE, id))
}
