//! Hand-written fakes of the ports, shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::domain::{Comment, PostPage, PostSummary, Profile, SessionUser};
use crate::ports::{
    AuthError, AuthService, CommentQuery, OAuthProvider, OAuthRedirect, PostQuery,
    ProfileRepository, QueryError, StateStore, StateStoreError,
};

#[derive(Default)]
pub(crate) struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
    pub(crate) fail_writes: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn raw(&self, key: &str) -> Option<String> {
        self.slots.lock().unwrap().get(key).cloned()
    }

    pub(crate) fn put_raw(&self, key: &str, value: &str) {
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateStoreError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StateStoreError::Io("disk full".into()));
        }
        self.put_raw(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StateStoreError> {
        self.slots.lock().unwrap().remove(key);
        Ok(())
    }
}

pub(crate) fn sample_post(id: i64) -> PostSummary {
    PostSummary {
        id,
        title: format!("Post {id}"),
        content: format!("Body of post {id}"),
        author: Some("tester".into()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id),
    }
}

/// In-process backend with switchable failures and per-page gates.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub(crate) posts: Vec<PostSummary>,
    pub(crate) comments: Mutex<Vec<Comment>>,
    pub(crate) accounts: Vec<(SessionUser, String)>,
    pub(crate) profiles: Mutex<HashMap<Uuid, Profile>>,
    pub(crate) fail_posts: AtomicBool,
    pub(crate) fail_comments: AtomicBool,
    pub(crate) fail_profiles: AtomicBool,
    pub(crate) fail_sign_out: AtomicBool,
    pub(crate) fetch_calls: AtomicUsize,
    pub(crate) add_comment_calls: AtomicUsize,
    gates: Mutex<HashMap<u32, Arc<Notify>>>,
    pub(crate) started: Notify,
}

impl FakeBackend {
    pub(crate) fn with_posts(count: i64) -> Self {
        Self {
            posts: (1..=count).rev().map(sample_post).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn with_account(mut self, user: SessionUser, password: &str) -> Self {
        self.accounts.push((user, password.to_string()));
        self
    }

    pub(crate) fn with_profile(self, profile: Profile) -> Self {
        self.profiles.lock().unwrap().insert(profile.id, profile);
        self
    }

    /// Hold `fetch_posts(page)` until the returned handle is notified.
    pub(crate) fn gate(&self, page: u32) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(page, notify.clone());
        notify
    }
}

#[async_trait]
impl PostQuery for FakeBackend {
    async fn fetch_posts(&self, page: u32, page_size: u32) -> Result<PostPage, QueryError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(&page).cloned();
        if let Some(gate) = gate {
            self.started.notify_one();
            gate.notified().await;
        }
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(QueryError::Transport("connection reset".into()));
        }
        let start = ((page - 1) * page_size) as usize;
        Ok(PostPage {
            posts: self
                .posts
                .iter()
                .skip(start)
                .take(page_size as usize)
                .cloned()
                .collect(),
            total_count: self.posts.len() as u64,
        })
    }

    async fn fetch_post(&self, post_id: i64) -> Result<PostSummary, QueryError> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(QueryError::Transport("connection reset".into()));
        }
        self.posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
            .ok_or(QueryError::NotFound)
    }
}

#[async_trait]
impl CommentQuery for FakeBackend {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, QueryError> {
        if self.fail_comments.load(Ordering::SeqCst) {
            return Err(QueryError::Backend("permission denied".into()));
        }
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn add_comment(&self, post_id: i64, content: &str) -> Result<(), QueryError> {
        self.add_comment_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_comments.load(Ordering::SeqCst) {
            return Err(QueryError::Backend("permission denied".into()));
        }
        let mut comments = self.comments.lock().unwrap();
        let id = comments.len() as i64 + 1;
        comments.push(Comment {
            id,
            post_id,
            content: content.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::minutes(id),
        });
        Ok(())
    }
}

#[async_trait]
impl AuthService for FakeBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        self.accounts
            .iter()
            .find(|(user, secret)| user.email == email && secret == password)
            .map(|(user, _)| user.clone())
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_url: &str,
    ) -> Result<OAuthRedirect, AuthError> {
        Ok(OAuthRedirect {
            provider,
            url: format!(
                "https://auth.test/authorize?provider={provider}&redirect_to={redirect_url}"
            ),
        })
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<SessionUser>, AuthError> {
        Ok(self
            .accounts
            .iter()
            .find(|(user, _)| user.id == user_id)
            .map(|(user, _)| user.clone()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for FakeBackend {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, QueryError> {
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(QueryError::Backend("profile table unavailable".into()));
        }
        self.profiles
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or(QueryError::NotFound)
    }

    async fn update_nickname(&self, user_id: Uuid, nickname: &str) -> Result<(), QueryError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles.get_mut(&user_id).ok_or(QueryError::NotFound)?;
        profile.nickname = Some(nickname.to_string());
        Ok(())
    }
}
