//! Integration tests for the HTTP request function and its response
//! classification, run against a throwaway axum backend bound to an
//! ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Multipart, RawQuery};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::sync::CancellationToken;

use hof_client::{
    ApiBody, ApiClient, ApiError, AuthPolicy, ClientConfig, ErrorPayload, RequestOptions,
    TokenStore, UploadKind,
};
use hof_core::types::SessionUser;
use hof_events::{SessionBus, SessionEvent};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Bind the router to an ephemeral local port and return its base URL.
async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

/// Build a client with an isolated token store and a fresh session bus.
fn test_client(base_url: &str) -> (tempfile::TempDir, ApiClient, Arc<SessionBus>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let tokens = TokenStore::new(dir.path().join("session.json"));
    let bus = Arc::new(SessionBus::default());
    let client = ApiClient::new(ClientConfig::new(base_url), tokens, bus.clone());
    (dir, client, bus)
}

fn seed_token(client: &ApiClient) {
    client
        .tokens()
        .save("abc123", &SessionUser::from_username("admin"))
        .expect("seeding the token store should succeed");
}

// ---------------------------------------------------------------------------
// Success classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn json_response_decodes_to_json_body() {
    let router = Router::new().route("/ok", get(|| async { Json(json!({"ok": true})) }));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let body = client
        .get("/ok", RequestOptions::new())
        .await
        .expect("request should succeed");

    assert_eq!(body, ApiBody::Json(json!({"ok": true})));
}

#[tokio::test]
async fn non_json_response_resolves_to_raw_text() {
    let router = Router::new().route("/plain", get(|| async { "hello" }));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let body = client
        .get("/plain", RequestOptions::new())
        .await
        .expect("request should succeed");

    assert_eq!(body, ApiBody::Text("hello".to_string()));
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_clears_token_and_broadcasts_exactly_once() {
    let router = Router::new().route(
        "/secret",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "nope"}))) }),
    );
    let base = spawn_backend(router).await;
    let (_dir, client, bus) = test_client(&base);
    seed_token(&client);
    let mut rx = bus.subscribe();

    let err = client
        .get("/secret", RequestOptions::new())
        .await
        .expect_err("401 must fail");

    assert_eq!(err.status(), Some(401));
    assert_eq!(client.tokens().load_token(), None, "token must be cleared");

    assert_matches!(rx.try_recv(), Ok(SessionEvent::Unauthorized { .. }));
    assert_matches!(rx.try_recv(), Err(TryRecvError::Empty), "exactly one broadcast");
}

#[tokio::test]
async fn session_expired_status_419_is_an_auth_failure() {
    let router = Router::new().route(
        "/stale",
        get(|| async { StatusCode::from_u16(419).expect("valid status") }),
    );
    let base = spawn_backend(router).await;
    let (_dir, client, bus) = test_client(&base);
    seed_token(&client);
    let mut rx = bus.subscribe();

    let err = client
        .get("/stale", RequestOptions::new())
        .await
        .expect_err("419 must fail");

    assert_eq!(err.status(), Some(419));
    assert_eq!(client.tokens().load_token(), None);
    assert_matches!(rx.try_recv(), Ok(SessionEvent::Unauthorized { .. }));
}

#[tokio::test]
async fn generic_failure_has_no_auth_side_effects() {
    let router = Router::new().route(
        "/broken",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "boom"})),
            )
        }),
    );
    let base = spawn_backend(router).await;
    let (_dir, client, bus) = test_client(&base);
    seed_token(&client);
    let mut rx = bus.subscribe();

    let err = client
        .get("/broken", RequestOptions::new())
        .await
        .expect_err("500 must fail");

    assert_matches!(
        &err,
        ApiError::Status {
            status: 500,
            payload: ErrorPayload::Json(payload),
            ..
        } if payload["error"] == "boom"
    );
    assert_eq!(
        client.tokens().load_token().as_deref(),
        Some("abc123"),
        "token must survive a non-auth failure"
    );
    assert_matches!(rx.try_recv(), Err(TryRecvError::Empty), "no broadcast");
}

#[tokio::test]
async fn failure_with_text_body_carries_raw_text_payload() {
    let router = Router::new().route(
        "/teapot",
        get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }),
    );
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let err = client
        .get("/teapot", RequestOptions::new())
        .await
        .expect_err("418 must fail");

    assert_matches!(
        err,
        ApiError::Status {
            status: 418,
            payload: ErrorPayload::Text(text),
            ..
        } if text == "short and stout"
    );
}

// ---------------------------------------------------------------------------
// Query and auth attachment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn none_valued_query_params_are_omitted() {
    let router = Router::new().route(
        "/echo",
        get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
    );
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let opts = RequestOptions::new()
        .with_query("parent", Some("7".to_string()))
        .with_query("section", None)
        .with_query("page", Some("2".to_string()));
    let body = client.get("/echo", opts).await.expect("request should succeed");

    assert_eq!(body, ApiBody::Text("parent=7&page=2".to_string()));
}

async fn echo_auth(headers: HeaderMap) -> String {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("<absent>")
        .to_string()
}

#[tokio::test]
async fn if_available_policy_attaches_header_only_with_token() {
    let router = Router::new().route("/whoami", get(echo_auth));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let body = client
        .get("/whoami", RequestOptions::new().with_auth(AuthPolicy::IfAvailable))
        .await
        .expect("request should succeed");
    assert_eq!(body, ApiBody::Text("<absent>".to_string()));

    seed_token(&client);
    let body = client
        .get("/whoami", RequestOptions::new().with_auth(AuthPolicy::IfAvailable))
        .await
        .expect("request should succeed");
    assert_eq!(body, ApiBody::Text("Bearer abc123".to_string()));
}

#[tokio::test]
async fn always_policy_degrades_to_unauthenticated_without_token() {
    let router = Router::new().route("/whoami", get(echo_auth));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    // No token anywhere: the request still goes out, just unauthenticated.
    let body = client
        .get("/whoami", RequestOptions::new().with_auth(AuthPolicy::Always))
        .await
        .expect("request should succeed");
    assert_eq!(body, ApiBody::Text("<absent>".to_string()));

    seed_token(&client);
    let body = client
        .get("/whoami", RequestOptions::new().with_auth(AuthPolicy::Always))
        .await
        .expect("request should succeed");
    assert_eq!(body, ApiBody::Text("Bearer abc123".to_string()));
}

#[tokio::test]
async fn none_policy_never_attaches_header() {
    let router = Router::new().route("/whoami", get(echo_auth));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);
    seed_token(&client);

    let body = client
        .get("/whoami", RequestOptions::new().with_auth(AuthPolicy::None))
        .await
        .expect("request should succeed");

    assert_eq!(body, ApiBody::Text("<absent>".to_string()));
}

// ---------------------------------------------------------------------------
// Records and uploads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_records_unwraps_whatever_envelope_the_endpoint_uses() {
    let router = Router::new()
        .route("/gallery", get(|| async { Json(json!({"results": [{"id": 1}, {"id": 2}]})) }))
        .route("/awards", get(|| async { Json(json!([{"id": "a"}])) }));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let galleries = client
        .list_records("/gallery", &[])
        .await
        .expect("list should succeed");
    assert_eq!(galleries.len(), 2);

    let awards = client
        .list_records("/awards", &[])
        .await
        .expect("list should succeed");
    assert_eq!(awards.len(), 1);
    assert_eq!(awards[0]["id"], "a");
}

async fn record_upload(mut multipart: Multipart) -> Json<Value> {
    let mut seen = serde_json::Map::new();
    while let Some(field) = multipart.next_field().await.expect("well-formed multipart") {
        let name = field.name().expect("field name").to_string();
        if name == "image" {
            let file_name = field.file_name().expect("file name").to_string();
            let bytes = field.bytes().await.expect("file bytes");
            seen.insert("image_name".into(), file_name.into());
            seen.insert("image_len".into(), bytes.len().into());
        } else {
            let text = field.text().await.expect("field text");
            seen.insert(name, text.into());
        }
    }
    Json(Value::Object(seen))
}

#[tokio::test]
async fn upload_carries_type_discriminator_and_file() {
    let router = Router::new().route("/gallery", post(record_upload));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let echoed = client
        .upload_image(
            "/gallery",
            UploadKind::Create,
            &[("title", "Ceremony 2019".to_string())],
            "ceremony.jpg",
            vec![0xFF, 0xD8, 0xFF],
        )
        .await
        .expect("upload should succeed");

    assert_eq!(echoed["type"], "create");
    assert_eq!(echoed["title"], "Ceremony 2019");
    assert_eq!(echoed["image_name"], "ceremony.jpg");
    assert_eq!(echoed["image_len"], 3);
}

#[tokio::test]
async fn edit_image_upload_uses_its_own_discriminator() {
    let router = Router::new().route("/gallery", post(record_upload));
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let echoed = client
        .upload_image("/gallery", UploadKind::EditImage, &[], "new.png", vec![1, 2])
        .await
        .expect("upload should succeed");

    assert_eq!(echoed["type"], "edit-image");
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_token_aborts_an_in_flight_request() {
    let router = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "too late"
        }),
    );
    let base = spawn_backend(router).await;
    let (_dir, client, _bus) = test_client(&base);

    let cancel = CancellationToken::new();
    let handle = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .get("/slow", RequestOptions::new().with_cancel(cancel))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = handle.await.expect("task should not panic");
    assert_matches!(result, Err(ApiError::Cancelled));
}
