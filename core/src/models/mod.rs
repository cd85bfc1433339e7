//! Data models for the blog backend
//!
//! Record kinds stored by the snapshot store, one per table.

mod comment;
mod post;
mod row;

pub use comment::{BlogComment, CommentFields};
pub use post::{BlogPost, PostFields};
pub use row::Record;
