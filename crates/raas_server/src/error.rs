//! Error types for the request surface.

use raas_core::CoreError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a request.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No operation is mapped to the method and path.
    #[error("no route for {method} {path}")]
    NotFound {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Store error.
    #[error(transparent)]
    Store(#[from] CoreError),

    /// Response serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::InvalidRequest(_) | ServerError::NotFound { .. } => true,
            ServerError::Store(e) => e.is_caller_error(),
            ServerError::Serialization(_) => false,
        }
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::NotFound { .. } => 404,
            ServerError::Store(CoreError::UnknownSubpartition { .. }) => 404,
            ServerError::Store(e) if e.is_caller_error() => 400,
            ServerError::Store(CoreError::WriteAcknowledgement { .. }) => 503,
            ServerError::Store(_) | ServerError::Serialization(_) => 500,
        }
    }
}
