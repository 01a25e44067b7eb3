//! Post detail view: one post, its comments, and the comment form.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{Comment, PostSummary};
use crate::error::{ClientError, ValidationError};
use crate::listing::{LoadOutcome, LoadStatus};
use crate::ports::{CommentQuery, PostQuery};

#[derive(Debug, Clone)]
pub struct DetailSnapshot {
    pub post_id: Option<i64>,
    pub post: Option<PostSummary>,
    /// Newest first.
    pub comments: Vec<Comment>,
    pub status: LoadStatus,
    /// Last error of the comment list or the comment form.
    pub comment_error: Option<String>,
}

struct DetailState {
    post_id: Option<i64>,
    post: Option<PostSummary>,
    comments: Vec<Comment>,
    status: LoadStatus,
    comment_error: Option<String>,
    latest_ticket: u64,
}

pub struct PostDetailView {
    posts: Arc<dyn PostQuery>,
    comments: Arc<dyn CommentQuery>,
    state: Mutex<DetailState>,
}

impl PostDetailView {
    pub fn new(posts: Arc<dyn PostQuery>, comments: Arc<dyn CommentQuery>) -> Self {
        Self {
            posts,
            comments,
            state: Mutex::new(DetailState {
                post_id: None,
                post: None,
                comments: Vec::new(),
                status: LoadStatus::Idle,
                comment_error: None,
                latest_ticket: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> DetailSnapshot {
        let state = self.lock();
        DetailSnapshot {
            post_id: state.post_id,
            post: state.post.clone(),
            comments: state.comments.clone(),
            status: state.status.clone(),
            comment_error: state.comment_error.clone(),
        }
    }

    /// Show `post_id`: fetch the post and its comments together.
    ///
    /// A failed post fetch marks the view failed. A failed comment fetch is
    /// recorded in `comment_error` and keeps whatever comments were shown.
    pub async fn load(&self, post_id: i64) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            if state.post_id != Some(post_id) {
                state.post = None;
                state.comments.clear();
            }
            state.post_id = Some(post_id);
            state.status = LoadStatus::Loading;
            state.comment_error = None;
            state.latest_ticket += 1;
            state.latest_ticket
        };

        tracing::debug!(post_id, ticket, "Fetching post detail");
        let (post, comments) = futures::join!(
            self.posts.fetch_post(post_id),
            self.comments.list_comments(post_id)
        );

        let mut state = self.lock();
        if ticket != state.latest_ticket {
            tracing::debug!(post_id, ticket, "Discarding stale post detail");
            return LoadOutcome::Superseded;
        }

        match comments {
            Ok(comments) => state.comments = comments,
            Err(e) => {
                tracing::warn!(post_id, error = %e, "Failed to load comments");
                state.comment_error = Some(e.to_string());
            }
        }

        match post {
            Ok(post) => {
                state.post = Some(post);
                state.status = LoadStatus::Loaded;
                LoadOutcome::Loaded
            }
            Err(e) => {
                tracing::warn!(post_id, error = %e, "Failed to load post");
                state.status = LoadStatus::Failed(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Add a comment to the shown post, then refresh the comment list.
    ///
    /// Blank content is rejected before any request is made.
    pub async fn submit_comment(&self, content: &str) -> Result<(), ClientError> {
        let content = content.trim();

        let post_id = {
            let mut state = self.lock();
            let Some(post_id) = state.post_id else {
                return Err(ValidationError::NoPostSelected.into());
            };
            if content.is_empty() {
                let err = ValidationError::Empty { field: "comment" };
                state.comment_error = Some(err.to_string());
                return Err(err.into());
            }
            state.comment_error = None;
            post_id
        };

        if let Err(e) = self.comments.add_comment(post_id, content).await {
            tracing::warn!(post_id, error = %e, "Failed to save comment");
            self.lock().comment_error = Some(e.to_string());
            return Err(e.into());
        }
        tracing::info!(post_id, "Comment added");

        match self.comments.list_comments(post_id).await {
            Ok(comments) => {
                let mut state = self.lock();
                if state.post_id == Some(post_id) {
                    state.comments = comments;
                }
            }
            Err(e) => {
                tracing::warn!(post_id, error = %e, "Failed to refresh comments");
                self.lock().comment_error = Some(e.to_string());
            }
        }

        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, DetailState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
