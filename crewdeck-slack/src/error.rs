//! Error types for Slack Web API calls.

use thiserror::Error;

/// Slack error codes that mean the stored credential itself is dead.
const INVALID_TOKEN_CODES: &[&str] = &["invalid_auth", "account_inactive", "token_revoked"];

/// Errors that can occur while talking to the Slack Web API.
#[derive(Error, Debug)]
pub enum SlackError {
    /// Slack answered `ok: false` with a named error code
    /// (e.g. `name_taken`, `already_in_channel`, `invalid_auth`).
    #[error("Slack API error: {code}")]
    Api { code: String },

    /// Transport-level non-2xx response.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network/connection failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(String),
}

impl SlackError {
    /// Construct an API error from a Slack error code.
    pub fn api(code: impl Into<String>) -> Self {
        SlackError::Api { code: code.into() }
    }

    /// The named Slack error code, if this is an API error.
    pub fn code(&self) -> Option<&str> {
        match self {
            SlackError::Api { code } => Some(code),
            _ => None,
        }
    }

    /// True if the error means the bearer token is no longer usable
    /// (`invalid_auth`, `account_inactive`, `token_revoked`).
    pub fn is_invalid_token(&self) -> bool {
        self.code().is_some_and(|c| INVALID_TOKEN_CODES.contains(&c))
    }

    /// `name_taken` — the channel already exists.
    pub fn is_name_taken(&self) -> bool {
        self.code() == Some("name_taken")
    }

    /// `already_in_channel` — the invite is already satisfied.
    pub fn is_already_in_channel(&self) -> bool {
        self.code() == Some("already_in_channel")
    }

    /// `already_archived` — the archive is already satisfied.
    pub fn is_already_archived(&self) -> bool {
        self.code() == Some("already_archived")
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            SlackError::Network(format!("Connection failed: {err}"))
        } else if err.is_decode() {
            SlackError::Json(err.to_string())
        } else {
            SlackError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::Json(err.to_string())
    }
}

/// Result type for Slack operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;
