//! In-memory backend.
//!
//! Implements every backend port inside the process. Used when no backend
//! URL is configured and by integration tests.
//! Note: Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Map;
use tokio::sync::RwLock;
use uuid::Uuid;

use community_core::domain::{Comment, PostPage, PostSummary, Profile, SessionUser};
use community_core::ports::{
    AuthError, AuthService, CommentQuery, OAuthProvider, OAuthRedirect, PostQuery,
    ProfileRepository, QueryError,
};

/// Id of the account [`InMemoryBackend::demo`] seeds.
pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0001);

struct Account {
    user: SessionUser,
    password: String,
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    profiles: HashMap<Uuid, Profile>,
    /// Oldest first; queries reverse the order.
    posts: Vec<PostSummary>,
    comments: Vec<Comment>,
}

pub struct InMemoryBackend {
    tables: RwLock<Tables>,
    signed_in: RwLock<Option<Uuid>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            signed_in: RwLock::new(None),
        }
    }

    /// A backend with one demo account and a few pages of posts.
    ///
    /// The demo account keeps the same id across runs, so a session persisted
    /// by an earlier run still resolves.
    pub async fn demo() -> Self {
        let backend = Self::new();
        let demo = SessionUser::new(DEMO_USER_ID, "demo@example.com").with_created_at(Utc::now());
        backend.insert_account(demo, "password", Some("demo")).await;
        for n in 1..=25 {
            backend
                .add_post(
                    format!("Welcome thread #{n}"),
                    format!("Share anything you like. This is post number {n}."),
                    Some("demo"),
                )
                .await;
        }
        tracing::info!("In-memory backend seeded with demo data");
        backend
    }

    /// Register an account together with its profile row.
    pub async fn add_account(
        &self,
        email: &str,
        password: &str,
        nickname: Option<&str>,
    ) -> SessionUser {
        let user = SessionUser::new(Uuid::new_v4(), email).with_created_at(Utc::now());
        self.insert_account(user, password, nickname).await
    }

    async fn insert_account(
        &self,
        user: SessionUser,
        password: &str,
        nickname: Option<&str>,
    ) -> SessionUser {
        let mut tables = self.tables.write().await;
        tables.profiles.insert(
            user.id,
            Profile {
                id: user.id,
                nickname: nickname.map(str::to_string),
                extra: Map::new(),
            },
        );
        tables.accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );

        user
    }

    /// Delete an account, as an administrator would on the backend.
    pub async fn remove_account(&self, user_id: Uuid) {
        let mut tables = self.tables.write().await;
        tables.accounts.remove(&user_id);
        tables.profiles.remove(&user_id);
    }

    /// Account of the last successful sign-in, until signed out.
    pub async fn signed_in_user(&self) -> Option<Uuid> {
        *self.signed_in.read().await
    }

    pub async fn add_post(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        author: Option<&str>,
    ) -> PostSummary {
        let mut tables = self.tables.write().await;
        let post = PostSummary {
            id: tables.posts.len() as i64 + 1,
            title: title.into(),
            content: content.into(),
            author: author.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.posts.push(post.clone());
        post
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostQuery for InMemoryBackend {
    async fn fetch_posts(&self, page: u32, page_size: u32) -> Result<PostPage, QueryError> {
        let tables = self.tables.read().await;
        let skip = page.saturating_sub(1) as usize * page_size as usize;

        Ok(PostPage {
            posts: tables
                .posts
                .iter()
                .rev()
                .skip(skip)
                .take(page_size as usize)
                .cloned()
                .collect(),
            total_count: tables.posts.len() as u64,
        })
    }

    async fn fetch_post(&self, post_id: i64) -> Result<PostSummary, QueryError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or(QueryError::NotFound)
    }
}

#[async_trait]
impl CommentQuery for InMemoryBackend {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, QueryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<(), QueryError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Err(QueryError::Backend(format!(
                "post {post_id} does not exist"
            )));
        }

        let id = tables.comments.len() as i64 + 1;
        tables.comments.push(Comment {
            id,
            post_id,
            content: content.to_string(),
            created_at: Utc::now(),
        });

        tracing::debug!(post_id, comment_id = id, "Comment stored");
        Ok(())
    }
}

#[async_trait]
impl AuthService for InMemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let user = {
            let tables = self.tables.read().await;
            tables
                .accounts
                .values()
                .find(|a| a.user.email.eq_ignore_ascii_case(email) && a.password == password)
                .map(|a| a.user.clone())
                .ok_or(AuthError::InvalidCredentials)?
        };

        *self.signed_in.write().await = Some(user.id);
        Ok(user)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_url: &str,
    ) -> Result<OAuthRedirect, AuthError> {
        Err(AuthError::OAuth(format!(
            "{provider} sign-in is not available offline (redirect {redirect_url})"
        )))
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<SessionUser>, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.get(&user_id).map(|a| a.user.clone()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.signed_in.write().await.take();
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, QueryError> {
        let tables = self.tables.read().await;
        tables
            .profiles
            .get(&user_id)
            .cloned()
            .ok_or(QueryError::NotFound)
    }

    async fn update_nickname(&self, user_id: Uuid, nickname: &str) -> Result<(), QueryError> {
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&user_id)
            .ok_or(QueryError::NotFound)?;
        profile.nickname = Some(nickname.to_string());
        Ok(())
    }
}
