//! HTTP client for the Hall of Fame admin backend.
//!
//! This crate is the whole network boundary: URL construction, query and
//! body encoding, bearer-token attachment, and response classification.
//! Authentication failures (401/403/419) clear the persisted token and
//! publish [`hof_events::SessionEvent::Unauthorized`] before the error is
//! returned, so the session layer can tear down without polling.

pub mod auth;
pub mod config;
pub mod error;
pub mod records;
pub mod request;
pub mod token;

pub use auth::AuthPolicy;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorPayload};
pub use records::UploadKind;
pub use request::{ApiBody, ApiClient, RequestBody, RequestOptions};
pub use token::TokenStore;
