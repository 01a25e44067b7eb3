//! Client-level error types.

use thiserror::Error;

use crate::ports::{AuthError, QueryError};

/// Input rejected before any request reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("No post is selected")]
    NoPostSelected,

    #[error("Unknown OAuth provider: {0}")]
    UnknownProvider(String),
}

/// Session store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No user is signed in")]
    NoActiveSession,

    #[error("Update would corrupt the session record: {0}")]
    InvalidPatch(String),
}

/// Post listing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("Page {page} is out of range (total pages: {total_pages})")]
    PageOutOfRange { page: u32, total_pages: u32 },
}

/// Any error a client flow can return to its view.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error("Sign in first")]
    NotSignedIn,
}
