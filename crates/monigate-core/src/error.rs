//! Shared error type across monigate crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Missing or unknown API token.
    Unauthenticated,
    /// Authenticated, but the role is not allowed on this route.
    Forbidden,
    /// Rate limited.
    RateLimited,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Unauthenticated => "UNAUTHENTICATED",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::RateLimited => "RATE_LIMITED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MonigateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum MonigateError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("rate limited")]
    RateLimited,
    #[error("malformed artifact {artifact} at line {line}: {detail}")]
    MalformedArtifact {
        artifact: String,
        line: usize,
        detail: String,
    },
    #[error("io: {0}")]
    Io(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MonigateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MonigateError::BadRequest(_) | MonigateError::Config(_) => ClientCode::BadRequest,
            MonigateError::Unauthenticated => ClientCode::Unauthenticated,
            MonigateError::Forbidden => ClientCode::Forbidden,
            MonigateError::RateLimited => ClientCode::RateLimited,
            MonigateError::MalformedArtifact { .. }
            | MonigateError::Io(_)
            | MonigateError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Whether the detail of this error may be shown to callers.
    ///
    /// Internal failures carry paths and parser output; those stay in logs.
    pub fn is_client_safe(&self) -> bool {
        !matches!(self.client_code(), ClientCode::Internal)
    }
}
