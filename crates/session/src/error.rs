use hof_client::ApiError;

/// Errors from the session layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A login request is already in flight; this submission was dropped,
    /// not queued.
    #[error("a login request is already in flight")]
    LoginInFlight,

    /// The login call completed but no token could be extracted from the
    /// response.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The login call itself failed at the network boundary.
    #[error(transparent)]
    Api(#[from] ApiError),
}
