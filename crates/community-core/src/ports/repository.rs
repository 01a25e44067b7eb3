use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Profile;
use crate::ports::QueryError;

/// Profile table keyed by the auth account id.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the full profile row of a user.
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Profile, QueryError>;

    /// Change the nickname of a user.
    async fn update_nickname(&self, user_id: Uuid, nickname: &str) -> Result<(), QueryError>;
}
