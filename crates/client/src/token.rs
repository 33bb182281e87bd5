//! Durable session storage.
//!
//! The browser client kept its token in localStorage; here the same role is
//! played by a small JSON file holding the token and the synthesized user
//! record. Reads never fail outward: a missing or corrupt file is treated as
//! "no session".

use std::path::PathBuf;

use hof_core::types::SessionUser;
use serde::{Deserialize, Serialize};

/// Environment variable naming the session file location.
const SESSION_FILE_ENV: &str = "HOF_SESSION_FILE";

/// Default session file path, relative to the working directory.
const DEFAULT_SESSION_FILE: &str = ".hofadmin/session.json";

/// On-disk shape of a persisted session.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSession {
    token: Option<String>,
    user: Option<SessionUser>,
}

/// File-backed store for the session token and user record.
///
/// Cheaply cloneable; clones share the same path and therefore the same
/// persisted session.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the path named by `HOF_SESSION_FILE`, defaulting to
    /// `.hofadmin/session.json`.
    pub fn from_env() -> Self {
        let path =
            std::env::var(SESSION_FILE_ENV).unwrap_or_else(|_| DEFAULT_SESSION_FILE.into());
        Self::new(path)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the persisted token, if any.
    ///
    /// Surrounding quote characters are stripped defensively: tokens that
    /// went through a double JSON encoding arrive as `"\"abc\""`. An empty
    /// token is reported as absent.
    pub fn load_token(&self) -> Option<String> {
        self.read()
            .token
            .map(|t| strip_quotes(&t))
            .filter(|t| !t.is_empty())
    }

    /// Load the persisted user record, if any.
    pub fn load_user(&self) -> Option<SessionUser> {
        self.read().user
    }

    /// Persist a token and user record, creating parent directories as
    /// needed.
    pub fn save(&self, token: &str, user: &SessionUser) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let session = PersistedSession {
            token: Some(token.to_string()),
            user: Some(user.clone()),
        };
        let json = serde_json::to_string_pretty(&session)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }

    /// Remove the persisted session.
    ///
    /// A missing file is not an error; any other I/O failure is logged and
    /// swallowed so that request classification can never fail on cleanup.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to clear session file");
            }
        }
    }

    fn read(&self) -> PersistedSession {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return PersistedSession::default();
        };
        serde_json::from_str(&contents).unwrap_or_default()
    }
}

/// Strip surrounding `"` characters left behind by double JSON encoding.
fn strip_quotes(token: &str) -> String {
    token.trim().trim_matches('"').to_string()
}
