//! Ports - trait definitions for the backend and local storage.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod query;
mod repository;
mod state;

pub use auth::{AuthError, AuthService, OAuthProvider, OAuthRedirect};
pub use query::{CommentQuery, PostQuery, QueryError};
pub use repository::ProfileRepository;
pub use state::{StateStore, StateStoreError};
