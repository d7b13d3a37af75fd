use wayfarer_core::error::CoreError;

use crate::upload::UploadError;

/// Errors surfaced by the client workflow.
///
/// Transport-level failures are normalized here so callers only ever
/// branch on these variants, never on `reqwest` internals.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A domain error, most often a failed validation gate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// No usable session, or the backend rejected the credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The backend answered with a non-2xx status other than 401/403.
    #[error("Backend error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A success response whose body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// One or more photos in a batch failed to upload.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ClientError::Auth(format!("backend rejected credentials ({status})")),
            _ => ClientError::Api { status, body },
        }
    }

    /// `true` when the failure came from the client-side validation gate.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Core(CoreError::Validation(_)))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::from_status(status.as_u16(), err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
