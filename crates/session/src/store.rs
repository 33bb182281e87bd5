//! The session store.
//!
//! State transitions:
//!
//! - `anonymous → authenticating` on a login submission (concurrent
//!   submissions are dropped, not queued).
//! - `authenticating → authenticated` when the login response yields a
//!   non-empty token; token and synthesized user are persisted.
//! - `authenticating → anonymous` on login failure, surfaced to the caller.
//! - `authenticated → anonymous` on explicit logout or on the unauthorized
//!   broadcast from the network layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use hof_client::{ApiClient, AuthPolicy, RequestOptions};
use hof_core::types::SessionUser;
use hof_events::SessionEvent;

use crate::error::SessionError;

/// Login endpoint path, relative to the client's base URL.
const LOGIN_PATH: &str = "auth/login";

/// Current session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No credentials; protected screens redirect to login.
    Anonymous,
    /// A login request is in flight.
    Authenticating,
    /// A token is persisted and a user record is known.
    Authenticated { user: SessionUser },
}

/// Holds the session state machine and drives the login call.
///
/// Share as `Arc<SessionStore>`; the unauthorized listener task and any
/// number of callers may touch the state concurrently.
pub struct SessionStore {
    client: ApiClient,
    state: Mutex<SessionState>,
    login_in_flight: AtomicBool,
}

impl SessionStore {
    /// Create a store over the given client, starting anonymous.
    pub fn new(client: ApiClient) -> Arc<Self> {
        Arc::new(Self {
            client,
            state: Mutex::new(SessionState::Anonymous),
            login_in_flight: AtomicBool::new(false),
        })
    }

    /// The client this store logs in through.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    /// Whether the session is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(*self.lock_state(), SessionState::Authenticated { .. })
    }

    /// Submit a login.
    ///
    /// While one login is in flight, further submissions perform no network
    /// I/O and return [`SessionError::LoginInFlight`]. On success the token
    /// and a locally-synthesized user record are persisted and the state
    /// becomes `Authenticated`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionUser, SessionError> {
        if self
            .login_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("login already in flight; dropping this submission");
            return Err(SessionError::LoginInFlight);
        }

        let result = self.do_login(username, password).await;
        self.login_in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn do_login(&self, username: &str, password: &str) -> Result<SessionUser, SessionError> {
        self.set_state(SessionState::Authenticating);

        let body = json!({ "username": username, "password": password });
        let opts = RequestOptions::new()
            .with_json(body)
            .with_auth(AuthPolicy::None);

        let response = match self.client.post(LOGIN_PATH, opts).await {
            Ok(body) => body.into_json(),
            Err(e) => {
                self.set_state(SessionState::Anonymous);
                return Err(e.into());
            }
        };

        let Some(token) = extract_login_token(&response) else {
            self.set_state(SessionState::Anonymous);
            return Err(SessionError::LoginFailed(
                "login response contained no token".to_string(),
            ));
        };

        let user = SessionUser::from_username(username);
        if let Err(e) = self.client.tokens().save(&token, &user) {
            tracing::warn!(error = %e, "failed to persist session; it will not survive a restart");
        }
        self.set_state(SessionState::Authenticated { user: user.clone() });
        tracing::info!(username, "login succeeded");
        Ok(user)
    }

    /// Rehydrate the state from persisted storage.
    ///
    /// Synchronous on purpose: the route guard calls this on first use of a
    /// protected screen, before any rendering decision. A login in flight is
    /// never clobbered.
    pub fn rehydrate(&self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *state == SessionState::Authenticating {
            return;
        }

        *state = match self.client.tokens().load_token() {
            Some(_) => {
                // A persisted token without a user record still counts as a
                // session; the user field is advisory.
                let user = self
                    .client
                    .tokens()
                    .load_user()
                    .unwrap_or_else(|| SessionUser::from_username("unknown"));
                SessionState::Authenticated { user }
            }
            None => SessionState::Anonymous,
        };
    }

    /// Explicit logout: clear persisted credentials, go anonymous.
    pub fn logout(&self) {
        tracing::info!("logging out");
        self.force_logout();
    }

    /// Subscribe to the client's session bus and force logout whenever the
    /// unauthorized broadcast arrives. Returns the listener task handle.
    pub fn spawn_unauthorized_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut rx = store.client.bus().subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SessionEvent::Unauthorized { .. }) => {
                        tracing::info!("unauthorized broadcast received; forcing logout");
                        store.force_logout();
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // The only event type is Unauthorized, so lagging
                        // means we missed at least one.
                        tracing::warn!(skipped, "session bus lagged; forcing logout");
                        store.force_logout();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn force_logout(&self) {
        self.client.tokens().clear();
        self.set_state(SessionState::Anonymous);
    }

    fn set_state(&self, next: SessionState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Extract the token from a login response.
///
/// The backend's envelope inconsistency applies to login too: the token has
/// been observed at `token`, `access_token`, and `data.token`.
fn extract_login_token(response: &Value) -> Option<String> {
    let candidates = [
        response.get("token"),
        response.get("access_token"),
        response.get("data").and_then(|d| d.get("token")),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string)
        .filter(|t| !t.is_empty())
}
