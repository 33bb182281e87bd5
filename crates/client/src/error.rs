//! Error types for the network boundary.

/// HTTP status codes classified as authentication failures.
///
/// 419 is the backend framework's "session expired" status; it behaves like
/// 401 for our purposes.
pub const AUTH_FAILURE_STATUSES: [u16; 3] = [401, 403, 419];

/// Whether a status code triggers session teardown.
pub fn is_auth_failure(status: u16) -> bool {
    AUTH_FAILURE_STATUSES.contains(&status)
}

/// Body of a failed response, parsed as JSON when the content type says so.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    Json(serde_json::Value),
    Text(String),
}

/// Errors from the network boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP round-trip itself failed (network, DNS, TLS, decode).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status. Authentication failures
    /// (401/403/419) also arrive here, after the token has been cleared and
    /// the unauthorized event published.
    #[error("API error ({status} {status_text}) at {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, empty when unknown.
        status_text: String,
        /// Full request URL, for diagnostics.
        url: String,
        /// Parsed response body.
        payload: ErrorPayload,
    },

    /// The caller's cancellation token fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Status code of a [`ApiError::Status`] error, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
