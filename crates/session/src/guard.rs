//! Route guard for protected screens.
//!
//! On first use the guard rehydrates the session store from persisted
//! storage, then either allows the protected content or redirects to the
//! login screen. The originating path is remembered so a later successful
//! login can return the user to it.

use std::sync::{Arc, Mutex, PoisonError};

use crate::store::SessionStore;

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session is authenticated; render the protected content.
    Allow,
    /// Not authenticated; redirect to the login screen.
    RedirectToLogin {
        /// The path the user was trying to reach.
        return_to: String,
    },
}

/// Guards access to protected paths based on session state.
pub struct RouteGuard {
    store: Arc<SessionStore>,
    return_to: Mutex<Option<String>>,
}

impl RouteGuard {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            return_to: Mutex::new(None),
        }
    }

    /// Check whether `path` may be shown.
    ///
    /// Rehydrates the store first so a persisted session from an earlier
    /// run is honored. On redirect, `path` is remembered for the post-login
    /// return.
    pub fn check(&self, path: &str) -> GuardDecision {
        self.store.rehydrate();

        if self.store.is_authenticated() {
            return GuardDecision::Allow;
        }

        tracing::debug!(path, "unauthenticated; redirecting to login");
        *self
            .return_to
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(path.to_string());
        GuardDecision::RedirectToLogin {
            return_to: path.to_string(),
        }
    }

    /// Take the remembered originating path, if a redirect happened.
    ///
    /// Consumed after a successful login to send the user back where they
    /// started.
    pub fn take_return_path(&self) -> Option<String> {
        self.return_to
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
