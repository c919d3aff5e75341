use std::path::PathBuf;

use thiserror::Error;

/// Every failure that crosses the client boundary.
///
/// Nothing here is fatal: callers surface `to_string()` to the user and let
/// them retry the action that produced it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Local validation failed, no request was sent.
    #[error("{0}")]
    Validation(String),

    #[error("User not logged in. Please log in again.")]
    NotLoggedIn,

    #[error("{0}")]
    NotFound(String),

    /// Non-2xx response. `body` is the raw server text.
    #[error("{context} (HTTP {status}): {body}")]
    Http {
        context: String,
        status: u16,
        body: String,
    },

    #[error("Network error: {context}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// 2xx response without a body we could read.
    #[error("{0}: Empty response body")]
    EmptyBody(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Cannot open selected file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Login/register failures already remapped to user-facing text.
    #[error("{0}")]
    Auth(String),

    #[error("Settings error: {0}")]
    Storage(String),

    #[error("Failed to load your appointments: {0}")]
    Load(#[source] Box<ApiError>),
}

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Auth("Invalid phone number or password.".into())
    }

    pub fn account_exists() -> Self {
        ApiError::Auth("An account with this phone number already exists.".into())
    }

    /// Replace the generic request context with an operation-specific one.
    /// Only transport-level variants carry a context; the rest pass through.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        match self {
            ApiError::Http { status, body, .. } => ApiError::Http {
                context: context.into(),
                status,
                body,
            },
            ApiError::Network { source, .. } => ApiError::Network {
                context: context.into(),
                source,
            },
            ApiError::EmptyBody(_) => ApiError::EmptyBody(context.into()),
            other => other,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Load(inner) => inner.status(),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}
