/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables for staging or demo deployments.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin plus API prefix; all request paths are relative to it.
    pub base_url: String,
    /// Optional token override for staging/demo environments. Consulted only
    /// when the persisted token store is empty.
    pub token_override: Option<String>,
}

/// Default backend origin for local development.
const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

impl ClientConfig {
    /// Build a config pointing at a specific base URL, with no token override.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_override: None,
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                     |
    /// |--------------------|-----------------------------|
    /// | `HOF_API_BASE_URL` | `http://localhost:8000/api` |
    /// | `HOF_API_TOKEN`    | unset                       |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("HOF_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let token_override = std::env::var("HOF_API_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            base_url,
            token_override,
        }
    }
}
