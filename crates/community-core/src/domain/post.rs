use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as shown in the listing and on its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PostSummary {
    /// Title for display; untitled posts get a placeholder.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

/// One page of posts plus the size of the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<PostSummary>,
    pub total_count: u64,
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
