//! Phone OTP login. Tokens live in cookies and never reach page scripts,
//! except the non-secret `blyss_user` profile.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use service_core::AppError;
use time::Duration;
use validator::Validate;

use crate::config::SiteSettings;
use crate::handlers::relay;
use crate::models::auth::{
    RegisterRequest, SavedUser, SendOtpRequest, TokenPair, VerifyOtpRequest,
};
use crate::models::booking::MyBookingsQuery;
use crate::services::backend_client::BackendReply;
use crate::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "blyss_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "blyss_refresh_token";
pub const USER_COOKIE: &str = "blyss_user";

fn session_cookie(
    site: &SiteSettings,
    name: &'static str,
    value: String,
    max_age: Duration,
    http_only: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .http_only(http_only)
        .secure(site.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .path("/")
        .build();

    if let Some(domain) = &site.cookie_domain {
        cookie.set_domain(domain.clone());
    }

    cookie
}

fn removal_cookie(site: &SiteSettings, name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    if let Some(domain) = &site.cookie_domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

fn with_tokens(jar: CookieJar, site: &SiteSettings, tokens: TokenPair) -> CookieJar {
    jar.add(session_cookie(
        site,
        ACCESS_TOKEN_COOKIE,
        tokens.access_token,
        Duration::hours(24),
        true,
    ))
    .add(session_cookie(
        site,
        REFRESH_TOKEN_COOKIE,
        tokens.refresh_token,
        Duration::days(30),
        true,
    ))
}

fn with_session(
    jar: CookieJar,
    site: &SiteSettings,
    body: &Value,
    user: &SavedUser,
) -> Result<CookieJar, AppError> {
    let tokens: TokenPair = serde_json::from_value(body.clone())
        .map_err(|_| AppError::BadGateway("Backend response is missing tokens".to_string()))?;
    let user_json = serde_json::to_string(user)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode user: {}", e)))?;

    Ok(with_tokens(jar, site, tokens).add(session_cookie(
        site,
        USER_COOKIE,
        user_json,
        Duration::days(365),
        false,
    )))
}

/// Drop token fields before a backend body is returned to the browser.
fn without_tokens(mut reply: BackendReply) -> BackendReply {
    if let Value::Object(map) = &mut reply.body {
        map.remove("access_token");
        map.remove("refresh_token");
    }
    reply
}

fn body_str(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub async fn send_otp_handler(
    State(state): State<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;
    let reply = state.backend.send_otp(&payload).await?;
    Ok(relay(reply))
}

pub async fn verify_otp_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<(CookieJar, Response), AppError> {
    payload.validate()?;
    let reply = state.backend.verify_otp(&payload).await?;

    let needs_registration = reply
        .body
        .get("needs_registration")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !reply.is_success() || needs_registration {
        return Ok((jar, relay(reply)));
    }

    let user = SavedUser {
        phone: payload.phone_number.clone(),
        first_name: body_str(&reply.body, "first_name"),
        last_name: body_str(&reply.body, "last_name"),
    };
    let jar = with_session(jar, &state.site, &reply.body, &user)?;

    tracing::info!(user_id = %body_str(&reply.body, "user_id"), "User signed in");
    Ok((jar, relay(without_tokens(reply))))
}

pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Result<(CookieJar, Response), AppError> {
    payload.validate()?;
    let reply = state.backend.register(&payload).await?;

    if !reply.is_success() {
        return Ok((jar, relay(reply)));
    }

    let user = SavedUser {
        phone: payload.phone_number.clone(),
        first_name: payload.first_name.clone(),
        last_name: payload.last_name.clone(),
    };
    let jar = with_session(jar, &state.site, &reply.body, &user)?;

    tracing::info!(user_id = %body_str(&reply.body, "user_id"), "User registered");
    Ok((jar, relay(without_tokens(reply))))
}

pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let Some(refresh_token) = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()) else {
        return Ok((jar, Json(json!({ "refreshed": false }))));
    };

    let reply = state.backend.refresh_token(&refresh_token).await?;
    if !reply.is_success() {
        return Ok((jar, Json(json!({ "refreshed": false }))));
    }

    let tokens: TokenPair = match serde_json::from_value(reply.body) {
        Ok(tokens) => tokens,
        Err(_) => return Ok((jar, Json(json!({ "refreshed": false })))),
    };

    let jar = with_tokens(jar, &state.site, tokens);
    Ok((jar, Json(json!({ "refreshed": true }))))
}

pub async fn logout_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar
        .remove(removal_cookie(&state.site, ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(&state.site, REFRESH_TOKEN_COOKIE))
        .remove(removal_cookie(&state.site, USER_COOKIE));

    (jar, Json(json!({ "success": true })))
}

pub fn access_token(jar: &CookieJar) -> Option<String> {
    jar.get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn me_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let token = access_token(&jar)
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Not authenticated")))?;

    let reply = state.backend.me(&token).await?;
    Ok(relay(reply))
}

pub async fn my_bookings_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::extract::Query(query): axum::extract::Query<MyBookingsQuery>,
) -> Result<Response, AppError> {
    let Some(token) = access_token(&jar) else {
        return Ok(Json(json!({ "bookings": [] })).into_response());
    };

    let reply = state
        .backend
        .my_bookings(&token, query.business_id.as_deref())
        .await?;
    if !reply.is_success() {
        return Ok(Json(json!({ "bookings": [] })).into_response());
    }

    Ok(relay(reply))
}
