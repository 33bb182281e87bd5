//! Bearer-token header construction.
//!
//! There is exactly one header format: `Authorization: Bearer <token>`.
//! When no token is available the provider returns an empty map and the
//! request proceeds unauthenticated.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Whether, and under what condition, a request carries the auth header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    /// Attach whatever the header provider produces. Differs from
    /// [`IfAvailable`](Self::IfAvailable) only when no token resolves: the
    /// request still goes out unauthenticated, but a warning is logged
    /// because the caller expected credentials.
    Always,
    /// Attach the header only when a non-empty token is available.
    #[default]
    IfAvailable,
    /// Never attach the header, even if a token exists. Used by the login
    /// call itself.
    None,
}

/// Produce the header map for the next outgoing request.
///
/// Returns an empty map when `token` is absent or empty; otherwise a map
/// with exactly one `Authorization` entry. A token containing characters
/// invalid in a header value is dropped with a warning rather than
/// poisoning the request.
pub fn auth_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return headers;
    };

    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(value) => {
            headers.insert(AUTHORIZATION, value);
        }
        Err(e) => {
            tracing::warn!(error = %e, "token is not a valid header value; sending unauthenticated");
        }
    }

    headers
}
