use std::sync::Arc;

use crate::domain::{SessionUser, UserPatch};
use crate::error::{ClientError, ValidationError};
use crate::ports::{AuthService, ProfileRepository};
use crate::session::SessionStore;

/// Profile page actions for the signed-in user.
pub struct ProfileFlow {
    auth: Arc<dyn AuthService>,
    profiles: Arc<dyn ProfileRepository>,
    session: Arc<SessionStore>,
}

impl ProfileFlow {
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

    /// Save a new nickname and merge the stored profile row into the session.
    pub async fn update_nickname(&self, nickname: &str) -> Result<SessionUser, ClientError> {
        let user = self.session.current().ok_or(ClientError::NotSignedIn)?;

        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(ValidationError::Empty { field: "nickname" }.into());
        }

        self.profiles
            .update_nickname(user.id, nickname)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Nickname update failed");
                e
            })?;

        // Re-read the row so columns changed by the backend reach the session too.
        let patch = match self.profiles.fetch_profile(user.id).await {
            Ok(profile) => UserPatch::from(profile),
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to re-read profile");
                UserPatch::new().nickname(nickname)
            }
        };

        let updated = self.session.update_user(patch).await?;
        tracing::info!(user_id = %updated.id, "Nickname updated");

        Ok(updated)
    }

    /// Sign out. The local session is cleared even if the backend call fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.auth.sign_out().await {
            tracing::warn!(error = %e, "Backend sign-out failed");
        }
        self.session.clear_user().await;
        tracing::info!("Signed out");
    }
}
