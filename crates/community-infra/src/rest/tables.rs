//! Table API endpoints: posts, comments and user profiles.

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, RANGE};
use uuid::Uuid;

use community_core::domain::{Comment, PostPage, PostSummary, Profile};
use community_core::ports::{CommentQuery, PostQuery, ProfileRepository, QueryError};
use community_shared::dto::{CommentRow, NewCommentRow, NicknameUpdate, PostRow, ProfileRow};
use community_shared::{ContentRange, range::page_range};

use super::{RestBackend, query_error, transport_error, url_error};

const POST_COLUMNS: &str = "id,title,author,content,created_at";

fn post_summary(row: PostRow) -> PostSummary {
    PostSummary {
        id: row.id,
        title: row.title.unwrap_or_default(),
        content: row.content.unwrap_or_default(),
        author: row.author,
        created_at: row.created_at,
    }
}

fn comment(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        post_id: row.post_id,
        content: row.content,
        created_at: row.created_at,
    }
}

fn profile(row: ProfileRow) -> Profile {
    Profile {
        id: row.id,
        nickname: row.nickname,
        extra: row.extra,
    }
}

fn decode_error(e: reqwest::Error) -> QueryError {
    QueryError::Decode(e.to_string())
}

#[async_trait]
impl PostQuery for RestBackend {
    async fn fetch_posts(&self, page: u32, page_size: u32) -> Result<PostPage, QueryError> {
        let request = self
            .http
            .get(self.endpoint("rest/v1/posts").map_err(url_error)?)
            .query(&[("select", POST_COLUMNS), ("order", "created_at.desc")])
            .header("Range-Unit", "items")
            .header(RANGE, page_range(page, page_size))
            .header("Prefer", "count=exact");

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(transport_error)?;

        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<ContentRange>().ok());

        // Asking past the end answers 416 with the total count in the header.
        if response.status().as_u16() == 416 {
            if let Some(total_count) = content_range.and_then(|r| r.total) {
                return Ok(PostPage {
                    posts: Vec::new(),
                    total_count,
                });
            }
        }

        if !response.status().is_success() {
            return Err(query_error(response).await);
        }

        let total_count = content_range
            .and_then(|r| r.total)
            .ok_or_else(|| QueryError::Decode("Missing total count in Content-Range".into()))?;
        let rows: Vec<PostRow> = response.json().await.map_err(decode_error)?;

        tracing::debug!(page, rows = rows.len(), total_count, "Posts page fetched");
        Ok(PostPage {
            posts: rows.into_iter().map(post_summary).collect(),
            total_count,
        })
    }

    async fn fetch_post(&self, post_id: i64) -> Result<PostSummary, QueryError> {
        let request = self
            .http
            .get(self.endpoint("rest/v1/posts").map_err(url_error)?)
            .query(&[
                ("select", POST_COLUMNS.to_string()),
                ("id", format!("eq.{post_id}")),
                ("limit", "1".to_string()),
            ]);

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(query_error(response).await);
        }

        let rows: Vec<PostRow> = response.json().await.map_err(decode_error)?;
        rows.into_iter()
            .next()
            .map(post_summary)
            .ok_or(QueryError::NotFound)
    }
}

#[async_trait]
impl CommentQuery for RestBackend {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, QueryError> {
        let request = self
            .http
            .get(self.endpoint("rest/v1/comments").map_err(url_error)?)
            .query(&[
                ("select", "*".to_string()),
                ("post_id", format!("eq.{post_id}")),
                ("order", "created_at.desc".to_string()),
            ]);

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(query_error(response).await);
        }

        let rows: Vec<CommentRow> = response.json().await.map_err(decode_error)?;
        Ok(rows.into_iter().map(comment).collect())
    }

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<(), QueryError> {
        let request = self
            .http
            .post(self.endpoint("rest/v1/comments").map_err(url_error)?)
            .header("Prefer", "return=minimal")
            .json(&NewCommentRow {
                post_id,
                content: content.to_string(),
            });

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(query_error(response).await);
        }

        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for RestBackend {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, QueryError> {
        let request = self
            .http
            .get(self.endpoint("rest/v1/users").map_err(url_error)?)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{user_id}"))]);

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(query_error(response).await);
        }

        let rows: Vec<ProfileRow> = response.json().await.map_err(decode_error)?;
        rows.into_iter()
            .next()
            .map(profile)
            .ok_or(QueryError::NotFound)
    }

    async fn update_nickname(&self, user_id: Uuid, nickname: &str) -> Result<(), QueryError> {
        let request = self
            .http
            .patch(self.endpoint("rest/v1/users").map_err(url_error)?)
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=minimal")
            .json(&NicknameUpdate {
                nickname: nickname.to_string(),
            });

        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(query_error(response).await);
        }

        Ok(())
    }
}
