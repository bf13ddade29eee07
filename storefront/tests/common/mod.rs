#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use secrecy::Secret;
use serde_json::Value;
use service_core::signing::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use service_core::utils::signature::verify_signature;
use service_core::{FixedClock, RequestSigner, TenancyConfig};
use std::sync::Arc;
use storefront::config::{BackendSettings, SiteSettings};
use storefront::services::backend_client::BackendClient;
use storefront::services::metrics::detached_handle;
use storefront::startup::build_router;
use storefront::AppState;
use tower::ServiceExt;
use wiremock::{Match, MockServer};

pub const TEST_SECRET: &str = "test-api-secret";
pub const NOW: i64 = 1_718_000_000;

/// Storefront router wired to a mock booking backend.
pub struct TestApp {
    pub backend: MockServer,
    pub router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let backend = MockServer::start().await;
        let client = backend_client(&backend.uri());

        let state = AppState::new(
            Arc::new(client),
            Arc::new(TenancyConfig::default()),
            Arc::new(SiteSettings {
                url: "https://blyss.uz".to_string(),
                cookie_domain: Some(".blyss.uz".to_string()),
                secure_cookies: true,
            }),
            detached_handle(),
        );

        TestApp {
            backend,
            router: build_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn backend_settings(url: &str) -> BackendSettings {
    BackendSettings {
        url: url.to_string(),
        api_secret: Secret::new(TEST_SECRET.to_string()),
        timeout_secs: 5,
    }
}

pub fn backend_client(url: &str) -> BackendClient {
    let settings = backend_settings(url);
    let signer =
        RequestSigner::new(settings.api_secret.clone(), Arc::new(FixedClock(NOW))).unwrap();
    BackendClient::new(&settings, signer).unwrap()
}

pub fn get(host: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(host: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, host)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(host: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, host)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Matches requests whose `x-signature` verifies against the test secret.
pub struct ValidSignature;

impl Match for ValidSignature {
    fn matches(&self, request: &wiremock::Request) -> bool {
        let header = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let (Some(timestamp), Some(signature)) = (header(TIMESTAMP_HEADER), header(SIGNATURE_HEADER))
        else {
            return false;
        };
        let Ok(body) = std::str::from_utf8(&request.body) else {
            return false;
        };

        timestamp == NOW.to_string()
            && verify_signature(TEST_SECRET.as_bytes(), body, &timestamp, &signature)
                .unwrap_or(false)
    }
}
