//! Backend client errors.

/// Errors from the detection backend client.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Backend error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The backend's `error` field, or the raw body.
        message: String,
    },

    /// A 2xx response carrying `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The response did not match the expected contract.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Failures of the channel rather than verdicts from the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Request(_) | BackendError::Malformed(_))
    }

    /// Text suitable to show the user verbatim.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } | BackendError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Malformed(e.to_string())
    }
}
