//! Query ports for posts and comments.

use async_trait::async_trait;

use crate::domain::{Comment, PostPage, PostSummary};

/// Read access to the post table.
#[async_trait]
pub trait PostQuery: Send + Sync {
    /// Fetch the 1-indexed `page` of posts, newest first, with the total count.
    async fn fetch_posts(&self, page: u32, page_size: u32) -> Result<PostPage, QueryError>;

    /// Fetch a single post.
    async fn fetch_post(&self, post_id: i64) -> Result<PostSummary, QueryError>;
}

/// Comment table access. Comments are append-only.
#[async_trait]
pub trait CommentQuery: Send + Sync {
    /// Comments of a post, newest first.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, QueryError>;

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<(), QueryError>;
}

/// Failure talking to the backend's tables. The message is meant for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{0}")]
    Backend(String),

    #[error("Record not found")]
    NotFound,

    #[error("Unexpected response: {0}")]
    Decode(String),
}
