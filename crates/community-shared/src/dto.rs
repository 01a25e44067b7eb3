//! Data Transfer Objects - request/response bodies of the auth and table APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Body of `POST /auth/v1/token?grant_type=password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordGrantRequest {
    pub email: String,
    pub password: String,
}

/// Successful token grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUserDto,
}

/// Account record returned by the auth API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserDto {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Row of the `posts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRow {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row of the `comments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Insert body for the `comments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCommentRow {
    pub post_id: i64,
    pub content: String,
}

/// Row of the `users` profile table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Patch body for the `users` profile table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicknameUpdate {
    pub nickname: String,
}
