//! Command errors - one line for the user and a process exit status.

use community_core::ClientError;
use community_core::error::{ListingError, SessionError};
use community_core::ports::{AuthError, QueryError, StateStoreError};

/// Application-level error every command returns.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Exit status, following the BSD `sysexits.h` codes.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::BadRequest(_) => 65,
            CliError::NotFound(_) => 66,
            CliError::Unavailable(_) => 69,
            CliError::Internal(_) => 70,
            CliError::Remote(_) => 76,
            CliError::Unauthorized(_) => 77,
            CliError::Config(_) => 78,
        }
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => CliError::Unauthorized(err.to_string()),
            AuthError::OAuth(msg) => CliError::BadRequest(msg),
            AuthError::Backend(msg) => CliError::Remote(msg),
            AuthError::Transport(msg) => CliError::Unavailable(msg),
        }
    }
}

impl From<QueryError> for CliError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound => CliError::NotFound(err.to_string()),
            QueryError::Transport(msg) => CliError::Unavailable(msg),
            QueryError::Backend(msg) => CliError::Remote(msg),
            QueryError::Decode(msg) => {
                tracing::error!(error = %msg, "Unreadable backend response");
                CliError::Remote(msg)
            }
        }
    }
}

impl From<ListingError> for CliError {
    fn from(err: ListingError) -> Self {
        CliError::BadRequest(err.to_string())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoActiveSession => CliError::Unauthorized(err.to_string()),
            SessionError::InvalidPatch(msg) => CliError::BadRequest(msg),
        }
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Validation(e) => CliError::BadRequest(e.to_string()),
            ClientError::Auth(e) => e.into(),
            ClientError::Query(e) => e.into(),
            ClientError::Session(e) => e.into(),
            ClientError::Listing(e) => e.into(),
            ClientError::NotSignedIn => CliError::Unauthorized(err.to_string()),
        }
    }
}

impl From<StateStoreError> for CliError {
    fn from(err: StateStoreError) -> Self {
        CliError::Unavailable(err.to_string())
    }
}

/// Result type alias for commands.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use community_core::error::ValidationError;

    use super::*;

    #[test]
    fn test_client_errors_map_to_exit_codes() {
        let cases = [
            (ClientError::NotSignedIn, 77),
            (ClientError::Auth(AuthError::InvalidCredentials), 77),
            (ClientError::Query(QueryError::NotFound), 66),
            (
                ClientError::Query(QueryError::Transport("refused".into())),
                69,
            ),
            (
                ClientError::Validation(ValidationError::Empty { field: "nickname" }),
                65,
            ),
            (
                ClientError::Listing(ListingError::PageOutOfRange {
                    page: 4,
                    total_pages: 3,
                }),
                65,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_message_is_single_line() {
        let err = CliError::from(ClientError::Validation(ValidationError::Empty {
            field: "comment",
        }));
        assert!(!err.to_string().contains('\n'));
    }
}
