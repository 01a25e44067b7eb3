//! Error bodies returned by the backend.
//!
//! The table API answers with `{message, code, details, hint}`; the auth API
//! uses `{error, error_description}` or `{code, msg}` depending on the
//! endpoint. All of them deserialize into [`ErrorResponse`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// String for the table API, HTTP status number for the auth API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Parse an error body; bodies that are not JSON become the message.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                Self::default()
            } else {
                Self::new(trimmed)
            }
        })
    }

    /// The most specific human-readable message in the body.
    pub fn message(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }

    /// Message for display, falling back to the HTTP status.
    pub fn describe(&self, status: u16) -> String {
        match (self.message(), &self.hint) {
            (Some(message), Some(hint)) => format!("{message} ({hint})"),
            (Some(message), None) => message.to_string(),
            (None, _) => format!("Request failed with status {status}"),
        }
    }

    /// Whether the auth API rejected the email/password pair.
    pub fn is_invalid_credentials(&self) -> bool {
        self.error.as_deref() == Some("invalid_grant")
            || self.error_code.as_deref() == Some("invalid_credentials")
    }

    /// Whether the table API reported that a single-row query matched nothing.
    pub fn is_no_rows(&self) -> bool {
        self.code.as_ref().and_then(Value::as_str) == Some("PGRST116")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_api_error() {
        let body = r#"{"code":"42501","details":null,"hint":"check policies","message":"permission denied for table comments"}"#;
        let error = ErrorResponse::from_body(body);
        assert_eq!(
            error.describe(403),
            "permission denied for table comments (check policies)"
        );
        assert!(!error.is_no_rows());
    }

    #[test]
    fn test_auth_api_invalid_grant() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let error = ErrorResponse::from_body(body);
        assert!(error.is_invalid_credentials());
        assert_eq!(error.message(), Some("Invalid login credentials"));
    }

    #[test]
    fn test_auth_api_numeric_code() {
        let body = r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;
        let error = ErrorResponse::from_body(body);
        assert!(error.is_invalid_credentials());
        assert_eq!(error.describe(400), "Invalid login credentials");
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(ErrorResponse::from_body("Bad Gateway").describe(502), "Bad Gateway");
        assert_eq!(
            ErrorResponse::from_body("").describe(502),
            "Request failed with status 502"
        );
    }
}
