//! Auth API endpoints.

use async_trait::async_trait;
use chrono::Utc;
use url::Url;
use uuid::Uuid;

use community_core::domain::SessionUser;
use community_core::ports::{AuthError, AuthService, OAuthProvider, OAuthRedirect};
use community_shared::dto::{AuthUserDto, PasswordGrantRequest, TokenResponse};

use super::{RestBackend, StoredToken, error_body};

/// Longest token lifetime we trust; longer `expires_in` values are clamped.
const MAX_TOKEN_LIFETIME_SECS: u64 = 60 * 60 * 24 * 365;

fn session_user(dto: AuthUserDto) -> SessionUser {
    SessionUser {
        id: dto.id,
        email: dto.email.unwrap_or_default(),
        nickname: None,
        created_at: dto.created_at,
        extra: dto.extra,
    }
}

fn transport(e: impl std::fmt::Display) -> AuthError {
    AuthError::Transport(e.to_string())
}

#[async_trait]
impl AuthService for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let mut url = self.endpoint("auth/v1/token").map_err(transport)?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http
            .post(url)
            .header("apikey", &self.config.anon_key)
            .json(&PasswordGrantRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let (status, body) = error_body(response).await;
            tracing::debug!(status, error = ?body, "Password grant rejected");
            return Err(if body.is_invalid_credentials() {
                AuthError::InvalidCredentials
            } else {
                AuthError::Backend(body.describe(status))
            });
        }

        let grant: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Backend(format!("Unexpected token response: {e}")))?;

        let user = session_user(grant.user);
        let lifetime = grant.expires_in.min(MAX_TOKEN_LIFETIME_SECS) as i64;
        self.store_token(StoredToken {
            user_id: user.id,
            access_token: grant.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        })
        .await;

        tracing::debug!(user_id = %user.id, "Access token issued");
        Ok(user)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_url: &str,
    ) -> Result<OAuthRedirect, AuthError> {
        Url::parse(redirect_url)
            .map_err(|e| AuthError::OAuth(format!("Invalid redirect URL: {e}")))?;

        let mut url = self
            .endpoint("auth/v1/authorize")
            .map_err(|e| AuthError::OAuth(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_url);

        Ok(OAuthRedirect {
            provider,
            url: url.into(),
        })
    }

    /// Looks the account up with its own access token; the anon key cannot
    /// read other accounts.
    async fn find_user(&self, user_id: Uuid) -> Result<Option<SessionUser>, AuthError> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .filter(|t| t.user_id == user_id && !t.is_expired())
            .ok_or_else(|| AuthError::Backend("No valid access token for this account".into()))?;

        let response = self
            .http
            .get(self.endpoint("auth/v1/user").map_err(transport)?)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            let dto: AuthUserDto = response
                .json()
                .await
                .map_err(|e| AuthError::Backend(format!("Unexpected user response: {e}")))?;
            return Ok(Some(session_user(dto)));
        }

        let (status, body) = error_body(response).await;
        if status == 404 || body.error_code.as_deref() == Some("user_not_found") {
            return Ok(None);
        }
        Err(AuthError::Backend(body.describe(status)))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(token) = self.forget_token().await else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.endpoint("auth/v1/logout").map_err(transport)?)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        // An expired token has no backend session left to end.
        if status.is_success() || status.as_u16() == 401 {
            return Ok(());
        }

        let (status, body) = error_body(response).await;
        Err(AuthError::Backend(body.describe(status)))
    }
}
