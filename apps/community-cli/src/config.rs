//! Application configuration loaded from environment variables.

use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;

use community_core::listing::DEFAULT_PAGE_SIZE;

#[cfg(feature = "rest")]
use community_infra::RestConfig;

use crate::error::{CliError, CliResult};

/// Where OAuth providers send the user back to when none is configured.
const DEFAULT_OAUTH_REDIRECT: &str = "http://localhost:3000/auth/callback";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hosted backend; `None` runs against the built-in demo backend.
    #[cfg(feature = "rest")]
    pub api: Option<RestConfig>,
    /// Directory of the file state store.
    pub state_dir: PathBuf,
    /// Redis URL; when set, state is kept in Redis instead of `state_dir`.
    pub redis_url: Option<String>,
    pub page_size: NonZeroU32,
    pub oauth_redirect: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> CliResult<Self> {
        let page_size = match env::var("COMMUNITY_PAGE_SIZE") {
            Ok(raw) => raw
                .parse::<NonZeroU32>()
                .map_err(|_| CliError::Config(format!("COMMUNITY_PAGE_SIZE: {raw:?}")))?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            #[cfg(feature = "rest")]
            api: RestConfig::from_env().map_err(|e| CliError::Config(e.to_string()))?,
            state_dir: env::var("COMMUNITY_STATE_DIR")
                .unwrap_or_else(|_| ".community".to_string())
                .into(),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            page_size,
            oauth_redirect: env::var("COMMUNITY_OAUTH_REDIRECT")
                .unwrap_or_else(|_| DEFAULT_OAUTH_REDIRECT.to_string()),
        })
    }
}
