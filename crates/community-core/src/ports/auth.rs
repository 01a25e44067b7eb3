//! Authentication port.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::SessionUser;
use crate::error::ValidationError;

/// Identity providers offered on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Github,
    Kakao,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
            OAuthProvider::Kakao => "kakao",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::Github),
            "kakao" => Ok(OAuthProvider::Kakao),
            other => Err(ValidationError::UnknownProvider(other.to_string())),
        }
    }
}

/// Where the user must be sent to finish an OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub provider: OAuthProvider,
    pub url: String,
}

/// Authentication service exposed by the backend.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign in with email and password, returning the account record.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, AuthError>;

    /// Start an OAuth sign-in. The callback itself is handled outside the client.
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_url: &str,
    ) -> Result<OAuthRedirect, AuthError>;

    /// Look up an account by id. `Ok(None)` means the account no longer exists.
    async fn find_user(&self, user_id: Uuid) -> Result<Option<SessionUser>, AuthError>;

    /// End the backend session, if the backend keeps one.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("OAuth sign-in failed: {0}")]
    OAuth(String),

    #[error("Authentication service error: {0}")]
    Backend(String),

    #[error("Authentication request failed: {0}")]
    Transport(String),
}
