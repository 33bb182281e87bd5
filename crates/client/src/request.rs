//! The HTTP request function.
//!
//! [`ApiClient::request`] performs one network round-trip: it builds the URL
//! from the configured base, encodes query and body, attaches the auth
//! header per policy, and classifies the response. Classification order:
//!
//! 1. 401/403/419 — clear the persisted token, publish one
//!    [`SessionEvent::Unauthorized`], fail with [`ApiError::Status`].
//! 2. Any other non-2xx — fail with [`ApiError::Status`], no side effects.
//! 3. 2xx — decode as JSON when the content type says so, else raw text.
//!
//! No retries and no internal timeout; callers that need timeout behavior
//! supply their own [`CancellationToken`].

use std::sync::Arc;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, Response};
use tokio_util::sync::CancellationToken;

use hof_events::{SessionBus, SessionEvent};

use crate::auth::{auth_headers, AuthPolicy};
use crate::config::ClientConfig;
use crate::error::{is_auth_failure, ApiError, ErrorPayload};
use crate::token::TokenStore;

/// Body attached to an outgoing request.
pub enum RequestBody {
    /// No body; GET and DELETE requests never set a body content type.
    None,
    /// JSON-serialized body, tagged `application/json`.
    Json(serde_json::Value),
    /// Multipart form passed through unmodified so the transport sets the
    /// boundary in the content type.
    Multipart(reqwest::multipart::Form),
}

/// Per-request options for [`ApiClient::request`].
///
/// Built with the `with_*` methods:
///
/// ```ignore
/// let opts = RequestOptions::new()
///     .with_query("parent", Some("7".to_string()))
///     .with_json(serde_json::json!({ "title": "New gallery" }));
/// ```
pub struct RequestOptions {
    /// Query pairs; `None` values are omitted entirely.
    pub query: Vec<(String, Option<String>)>,
    /// Request body.
    pub body: RequestBody,
    /// Auth header policy (default: [`AuthPolicy::IfAvailable`]).
    pub auth: AuthPolicy,
    /// Optional cancellation signal.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self {
            query: Vec::new(),
            body: RequestBody::None,
            auth: AuthPolicy::default(),
            cancel: None,
        }
    }

    /// Add one query pair. A `None` value means the pair is dropped before
    /// the request goes out.
    pub fn with_query(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.query.push((key.into(), value));
        self
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Attach a multipart form body.
    pub fn with_multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Set the auth policy.
    pub fn with_auth(mut self, auth: AuthPolicy) -> Self {
        self.auth = auth;
        self
    }

    /// Thread a cancellation signal into the request.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(serde_json::Value),
    Text(String),
}

impl ApiBody {
    /// The JSON value, when the response was JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ApiBody::Json(value) => Some(value),
            ApiBody::Text(_) => None,
        }
    }

    /// Consume into the JSON value, defaulting to `null` for text bodies.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            ApiBody::Json(value) => value,
            ApiBody::Text(_) => serde_json::Value::Null,
        }
    }
}

/// HTTP client for the admin backend.
///
/// Cheaply cloneable; clones share the connection pool, the token store
/// path, and the session bus.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: TokenStore,
    bus: Arc<SessionBus>,
}

impl ApiClient {
    /// Create a client over a fresh connection pool.
    pub fn new(config: ClientConfig, tokens: TokenStore, bus: Arc<SessionBus>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            tokens,
            bus,
        }
    }

    /// The token store this client clears on authentication failure.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The bus this client publishes unauthorized events on.
    pub fn bus(&self) -> &Arc<SessionBus> {
        &self.bus
    }

    /// Resolve the token for the next request: persisted store first, then
    /// the environment-level override from config.
    pub fn resolve_token(&self) -> Option<String> {
        self.tokens
            .load_token()
            .or_else(|| self.config.token_override.clone())
    }

    /// Perform one round-trip against `path` (relative to the base URL).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        opts: RequestOptions,
    ) -> Result<ApiBody, ApiError> {
        let url = self.build_url(path);

        let mut builder = self.http.request(method.clone(), &url);

        let query: Vec<(String, String)> = opts
            .query
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        match opts.body {
            RequestBody::None => {}
            RequestBody::Json(body) => builder = builder.json(&body),
            RequestBody::Multipart(form) => builder = builder.multipart(form),
        }

        builder = builder.headers(self.headers_for(opts.auth));

        tracing::debug!(%method, %url, "sending request");

        let send = builder.send();
        let response = match opts.cancel {
            Some(cancel) => tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%url, "request cancelled by caller");
                    return Err(ApiError::Cancelled);
                }
                result = send => result?,
            },
            None => send.await?,
        };

        self.classify(response).await
    }

    /// GET convenience wrapper.
    pub async fn get(&self, path: &str, opts: RequestOptions) -> Result<ApiBody, ApiError> {
        self.request(Method::GET, path, opts).await
    }

    /// POST convenience wrapper.
    pub async fn post(&self, path: &str, opts: RequestOptions) -> Result<ApiBody, ApiError> {
        self.request(Method::POST, path, opts).await
    }

    /// PATCH convenience wrapper.
    pub async fn patch(&self, path: &str, opts: RequestOptions) -> Result<ApiBody, ApiError> {
        self.request(Method::PATCH, path, opts).await
    }

    /// DELETE convenience wrapper.
    pub async fn delete(&self, path: &str, opts: RequestOptions) -> Result<ApiBody, ApiError> {
        self.request(Method::DELETE, path, opts).await
    }

    // ---- private helpers ----

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/'),
        )
    }

    fn headers_for(&self, policy: AuthPolicy) -> HeaderMap {
        let token = match policy {
            AuthPolicy::None => return HeaderMap::new(),
            AuthPolicy::Always | AuthPolicy::IfAvailable => self.resolve_token(),
        };

        if token.is_none() && policy == AuthPolicy::Always {
            tracing::warn!("auth policy requires a token but none resolved; sending unauthenticated");
        }

        auth_headers(token.as_deref())
    }

    /// Classify a response into success, authentication failure, or generic
    /// failure.
    async fn classify(&self, response: Response) -> Result<ApiBody, ApiError> {
        let status = response.status();
        let url = response.url().to_string();
        let json = content_type_is_json(response.headers());

        if is_auth_failure(status.as_u16()) {
            tracing::warn!(status = status.as_u16(), %url, "authentication failure; tearing down session");
            self.tokens.clear();
            self.bus.publish(SessionEvent::unauthorized());
            return Err(status_error(status, url, read_payload(response, json).await));
        }

        if !status.is_success() {
            return Err(status_error(status, url, read_payload(response, json).await));
        }

        if json {
            Ok(ApiBody::Json(response.json().await?))
        } else {
            Ok(ApiBody::Text(response.text().await?))
        }
    }
}

/// Whether the response content type indicates a JSON body.
fn content_type_is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(false)
}

fn status_error(status: reqwest::StatusCode, url: String, payload: ErrorPayload) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        url,
        payload,
    }
}

/// Read a failed response's body, as JSON when the content type says so.
///
/// An unreadable or unparsable body degrades to its raw text form; error
/// construction itself never fails.
async fn read_payload(response: Response, json: bool) -> ErrorPayload {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());

    if json {
        if let Ok(value) = serde_json::from_str(&text) {
            return ErrorPayload::Json(value);
        }
    }
    ErrorPayload::Text(text)
}
