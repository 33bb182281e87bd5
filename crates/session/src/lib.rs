//! Session state machine and route guard.
//!
//! [`store::SessionStore`] owns the `anonymous → authenticating →
//! authenticated` lifecycle. It is pushed back to `anonymous` by the
//! network layer's unauthorized broadcast; there is no polling and no
//! client-side expiry timer. [`guard::RouteGuard`] sits in front of
//! protected screens and either allows them or redirects to login,
//! remembering where the user was headed.

pub mod error;
pub mod guard;
pub mod store;

pub use error::SessionError;
pub use guard::{GuardDecision, RouteGuard};
pub use store::{SessionState, SessionStore};
