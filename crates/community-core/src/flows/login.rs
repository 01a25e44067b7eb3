use std::sync::Arc;

use crate::domain::SessionUser;
use crate::error::{ClientError, ValidationError};
use crate::ports::{AuthService, OAuthProvider, OAuthRedirect, ProfileRepository};
use crate::session::SessionStore;

/// Signs users in and keeps the session store in step with the backend.
pub struct LoginFlow {
    auth: Arc<dyn AuthService>,
    profiles: Arc<dyn ProfileRepository>,
    session: Arc<SessionStore>,
}

impl LoginFlow {
    pub fn new(
        auth: Arc<dyn AuthService>,
        profiles: Arc<dyn ProfileRepository>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            auth,
            profiles,
            session,
        }
    }

    /// Password sign-in.
    ///
    /// The auth record does not carry the nickname, so it is looked up in the
    /// profile table and merged in before the user is stored. If that lookup
    /// fails the user is still signed in, without a nickname.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, ClientError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::Empty { field: "email" }.into());
        }
        if password.is_empty() {
            return Err(ValidationError::Empty { field: "password" }.into());
        }

        let mut user = self.auth.sign_in(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, "Sign-in failed");
            e
        })?;

        match self.profiles.fetch_profile(user.id).await {
            Ok(profile) => user.nickname = profile.nickname,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to load nickname");
            }
        }

        self.session.set_user(user.clone()).await;
        tracing::info!(user_id = %user.id, "Signed in");

        Ok(user)
    }

    /// Start an OAuth sign-in; the caller sends the user to the returned URL.
    pub async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_url: &str,
    ) -> Result<OAuthRedirect, ClientError> {
        if redirect_url.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "redirect url",
            }
            .into());
        }

        let redirect = self
            .auth
            .sign_in_with_oauth(provider, redirect_url)
            .await
            .map_err(|e| {
                tracing::warn!(provider = %provider, error = %e, "OAuth sign-in failed");
                e
            })?;

        tracing::info!(provider = %provider, "OAuth sign-in started");
        Ok(redirect)
    }

    /// Check a restored session against the backend.
    ///
    /// The session is dropped only when the backend says the account is gone;
    /// if the backend cannot be reached the cached user is kept.
    pub async fn restore(&self) -> Option<SessionUser> {
        let user = self.session.current()?;

        match self.auth.find_user(user.id).await {
            Ok(Some(_)) => Some(user),
            Ok(None) => {
                tracing::info!(user_id = %user.id, "Persisted account no longer exists");
                self.session.clear_user().await;
                None
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Could not verify session; keeping it");
                Some(user)
            }
        }
    }
}
