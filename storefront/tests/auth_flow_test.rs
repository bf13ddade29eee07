//! OTP login, cookies and authenticated booking calls.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_with_cookie, post_json, set_cookies, TestApp, ValidSignature};
use serde_json::json;
use wiremock::matchers::{
    body_json as body_json_matcher, header, method, path, query_param_is_missing,
};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn verify_otp_for_existing_user_sets_session_cookies() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/public/verify-otp"))
        .and(header("content-type", "application/json"))
        .and(body_json_matcher(
            json!({ "phone_number": "+998901234567", "otp_code": 123456 }),
        ))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": "u1",
            "phone_number": "+998901234567",
            "first_name": "Aziz",
            "last_name": "Karimov",
            "access_token": "access-1",
            "refresh_token": "refresh-1"
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .send(post_json(
            "shop1.blyss.uz",
            "/api/auth/verify-otp",
            json!({ "phone_number": "+998901234567", "otp_code": 123456 }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("blyss_access_token=access-1") && c.contains("HttpOnly")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("blyss_refresh_token=refresh-1")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("blyss_user=") && !c.contains("HttpOnly")));

    let body = body_json(response).await;
    assert_eq!(body["user_id"], "u1");
    assert!(body.get("access_token").is_none());
    assert!(body.get("refresh_token").is_none());
}

#[tokio::test]
async fn verify_otp_for_new_user_defers_to_registration() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/public/verify-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "needs_registration": true,
            "otp_id": "otp-1",
            "phone_number": "+998901234567"
        })))
        .mount(&app.backend)
        .await;

    let response = app
        .send(post_json(
            "blyss.uz",
            "/api/auth/verify-otp",
            json!({ "phone_number": "+998901234567", "otp_code": 111111 }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["otp_id"], "otp-1");
}

#[tokio::test]
async fn send_otp_relays_backend_errors() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/public/send-otp"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": "Too many attempts",
            "error_code": "RATE_LIMITED",
            "wait_seconds": 60
        })))
        .mount(&app.backend)
        .await;

    let response = app
        .send(post_json(
            "blyss.uz",
            "/api/auth/send-otp",
            json!({ "phone_number": "+998901234567" }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["wait_seconds"], 60);
}

#[tokio::test]
async fn invalid_phone_is_rejected_locally() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.backend)
        .await;

    let response = app
        .send(post_json(
            "blyss.uz",
            "/api/auth/send-otp",
            json!({ "phone_number": "12" }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn booking_requires_session() {
    let app = TestApp::spawn().await;

    let response = app
        .send(post_json(
            "shop1.blyss.uz",
            "/bookings",
            json!({
                "date": "2025-03-01",
                "start_time": 600,
                "services": [{ "service_id": "s1", "employee_id": null }]
            }),
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_forwards_bearer_token() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/public/businesses/shop1/bookings-v2"))
        .and(header("authorization", "Bearer access-1"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "b1" })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .send(post_json(
            "shop1.blyss.uz",
            "/bookings",
            json!({
                "date": "2025-03-01",
                "start_time": 600,
                "services": [{ "service_id": "s1", "employee_id": null }],
                "notes": "window seat"
            }),
            Some("blyss_access_token=access-1"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"], "b1");
}

#[tokio::test]
async fn my_bookings_without_session_is_empty() {
    let app = TestApp::spawn().await;

    let response = app.send(get("blyss.uz", "/api/my-bookings")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "bookings": [] }));
}

#[tokio::test]
async fn tenant_bookings_keep_only_this_business() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/public/my-bookings"))
        .and(query_param_is_missing("business_id"))
        .and(header("authorization", "Bearer access-1"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bookings": [
            { "id": "b1", "business_id": "biz-1" },
            { "id": "b2", "business_id": "biz-2" }
        ]})))
        .expect(1)
        .mount(&app.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/public/businesses/shop1/services"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "business": { "id": "biz-1", "name": "Shop One" },
            "services": []
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .send(get_with_cookie(
            "shop1.blyss.uz",
            "/bookings",
            "blyss_access_token=access-1",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["bookings"], json!([{ "id": "b1", "business_id": "biz-1" }]));
    assert_eq!(body["other_count"], 1);
}

#[tokio::test]
async fn me_requires_session() {
    let app = TestApp::spawn().await;

    let response = app.send(get("blyss.uz", "/api/me")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_cookies() {
    let app = TestApp::spawn().await;

    let response = app
        .send(post_json(
            "shop1.blyss.uz",
            "/api/auth/logout",
            json!({}),
            Some("blyss_access_token=access-1; blyss_refresh_token=refresh-1; blyss_user=%7B%7D"),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    for name in ["blyss_access_token", "blyss_refresh_token", "blyss_user"] {
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&format!("{}=", name)) && c.contains("Max-Age=0")),
            "{} not cleared: {:?}",
            name,
            cookies
        );
    }
}

#[tokio::test]
async fn refresh_rotates_tokens() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/public/refresh-token"))
        .and(body_json_matcher(json!({ "refresh_token": "refresh-1" })))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "refresh_token": "refresh-2"
        })))
        .expect(1)
        .mount(&app.backend)
        .await;

    let response = app
        .send(post_json(
            "blyss.uz",
            "/api/auth/refresh",
            json!({}),
            Some("blyss_refresh_token=refresh-1"),
        ))
        .await;

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("blyss_access_token=access-2")));
    assert_eq!(body_json(response).await["refreshed"], true);
}
