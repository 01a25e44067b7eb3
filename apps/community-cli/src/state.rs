//! Application state - the backend ports and the session, wired once at startup.

use std::sync::Arc;

use community_core::SessionStore;
use community_core::detail::PostDetailView;
use community_core::flows::{LoginFlow, ProfileFlow};
use community_core::listing::PostListing;
use community_core::ports::{AuthService, CommentQuery, PostQuery, ProfileRepository, StateStore};
use community_infra::{FileStateStore, InMemoryBackend};

#[cfg(feature = "redis")]
use community_infra::{RedisConfig, RedisStateStore};
#[cfg(feature = "rest")]
use community_infra::RestBackend;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub session: Arc<SessionStore>,
    pub auth: Arc<dyn AuthService>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub posts: Arc<dyn PostQuery>,
    pub comments: Arc<dyn CommentQuery>,
}

/// The backend ports, all served by one backend.
struct Ports {
    auth: Arc<dyn AuthService>,
    profiles: Arc<dyn ProfileRepository>,
    posts: Arc<dyn PostQuery>,
    comments: Arc<dyn CommentQuery>,
}

impl Ports {
    fn of<B>(backend: Arc<B>) -> Self
    where
        B: AuthService + ProfileRepository + PostQuery + CommentQuery + 'static,
    {
        Self {
            auth: backend.clone(),
            profiles: backend.clone(),
            posts: backend.clone(),
            comments: backend,
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: AppConfig) -> CliResult<Self> {
        let storage = Self::state_store(&config).await?;
        let session = Arc::new(SessionStore::load(storage.clone()).await);

        let ports = Self::backend(&config, storage).await?;

        tracing::debug!(signed_in = session.is_signed_in(), "Application state initialized");

        Ok(Self {
            config,
            session,
            auth: ports.auth,
            profiles: ports.profiles,
            posts: ports.posts,
            comments: ports.comments,
        })
    }

    async fn state_store(config: &AppConfig) -> CliResult<Arc<dyn StateStore>> {
        if let Some(url) = &config.redis_url {
            #[cfg(feature = "redis")]
            {
                let redis = RedisConfig {
                    url: url.clone(),
                    ..RedisConfig::from_env()
                };
                return Ok(Arc::new(RedisStateStore::new(redis).await?));
            }

            #[cfg(not(feature = "redis"))]
            tracing::warn!(url = %url, "REDIS_URL set but redis support is not compiled in");
        }

        Ok(Arc::new(FileStateStore::open(&config.state_dir).await?))
    }

    async fn backend(config: &AppConfig, storage: Arc<dyn StateStore>) -> CliResult<Ports> {
        #[cfg(feature = "rest")]
        if let Some(api) = &config.api {
            let backend = RestBackend::connect(api.clone(), storage)
                .await
                .map_err(|e| CliError::Internal(e.to_string()))?;
            return Ok(Ports::of(Arc::new(backend)));
        }

        let _ = (config, storage);
        tracing::warn!("COMMUNITY_API_URL not set. Using the offline demo backend.");
        Ok(Ports::of(Arc::new(InMemoryBackend::demo().await)))
    }

    pub fn login(&self) -> LoginFlow {
        LoginFlow::new(self.auth.clone(), self.profiles.clone(), self.session.clone())
    }

    pub fn profile(&self) -> ProfileFlow {
        ProfileFlow::new(self.auth.clone(), self.profiles.clone(), self.session.clone())
    }

    pub fn listing(&self) -> PostListing {
        PostListing::with_page_size(self.posts.clone(), self.config.page_size)
    }

    pub fn detail(&self) -> PostDetailView {
        PostDetailView::new(self.posts.clone(), self.comments.clone())
    }
}
