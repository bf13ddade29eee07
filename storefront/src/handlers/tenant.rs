//! Tenant storefront routes. Reached through the Host rewrite, so the first
//! path segment is the tenant slug.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use service_core::{AppError, TenantContext, TenantSlug};
use validator::Validate;

use crate::handlers::auth::access_token;
use crate::handlers::relay;
use crate::models::booking::{CreateBookingRequest, SlotEmployeesQuery, SlotQuery};
use crate::models::business::LocationQuery;
use crate::AppState;

/// The path slug must be the tenant the request arrived for; `blyss.uz/shop1`
/// is not a storefront.
fn require_tenant(
    state: &AppState,
    ctx: Option<&TenantContext>,
    path_slug: &str,
) -> Result<TenantSlug, AppError> {
    match ctx.and_then(TenantContext::slug) {
        Some(slug) if slug == path_slug => Ok(state.tenancy.validate_tenant_slug(slug)?),
        _ => Err(AppError::NotFound(anyhow::anyhow!(
            "Invalid tenant: this page must be accessed via a subdomain"
        ))),
    }
}

pub async fn tenant_home(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    Path(tenant): Path<String>,
) -> Result<Response, AppError> {
    let slug = require_tenant(&state, ctx.as_deref(), &tenant)?;
    let reply = state.backend.business_services(&slug, None).await?;

    if !reply.is_success() {
        return Ok(relay(reply));
    }

    Ok(Json(json!({
        "tenant": { "slug": slug, "is_tenant": true },
        "business": reply.body,
    }))
    .into_response())
}

pub async fn tenant_services(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    Path(tenant): Path<String>,
    Query(query): Query<LocationQuery>,
) -> Result<Response, AppError> {
    let slug = require_tenant(&state, ctx.as_deref(), &tenant)?;
    let reply = state
        .backend
        .business_services(&slug, query.coordinates())
        .await?;
    Ok(relay(reply))
}

pub async fn available_slots(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    Path(tenant): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Result<Response, AppError> {
    let slug = require_tenant(&state, ctx.as_deref(), &tenant)?;
    query.validate()?;
    let reply = state.backend.available_slots(&slug, &query).await?;
    Ok(relay(reply))
}

pub async fn slot_employees(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    Path(tenant): Path<String>,
    Query(query): Query<SlotEmployeesQuery>,
) -> Result<Response, AppError> {
    let slug = require_tenant(&state, ctx.as_deref(), &tenant)?;
    query.validate()?;
    let reply = state.backend.slot_employees(&slug, &query).await?;
    Ok(relay(reply))
}

pub async fn create_booking(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    Path(tenant): Path<String>,
    jar: CookieJar,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Response, AppError> {
    let slug = require_tenant(&state, ctx.as_deref(), &tenant)?;
    let token = access_token(&jar)
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Not authenticated")))?;
    payload.validate()?;

    let reply = state.backend.create_booking(&slug, &token, &payload).await?;
    if reply.is_success() {
        tracing::info!(tenant = %slug, "Booking created");
    }
    Ok(relay(reply))
}

pub async fn tenant_bookings(
    State(state): State<AppState>,
    ctx: Option<Extension<TenantContext>>,
    Path(tenant): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let slug = require_tenant(&state, ctx.as_deref(), &tenant)?;
    let Some(token) = access_token(&jar) else {
        return Ok(Json(json!({ "bookings": [], "other_count": 0 })).into_response());
    };

    let (bookings, business) = tokio::join!(
        state.backend.my_bookings(&token, None),
        state.backend.business_services(&slug, None),
    );

    let bookings = match bookings? {
        reply if reply.is_success() => reply.body,
        _ => return Ok(Json(json!({ "bookings": [], "other_count": 0 })).into_response()),
    };
    let business_id = match business {
        Ok(reply) if reply.is_success() => reply.body["business"]["id"]
            .as_str()
            .map(str::to_string),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(tenant = %slug, error = %e, "Could not resolve business id");
            None
        }
    };

    Ok(Json(bookings_for_business(bookings, business_id.as_deref())).into_response())
}

/// Keep the bookings made at `business_id` and count the rest. Without a
/// business id every booking is kept.
pub fn bookings_for_business(body: Value, business_id: Option<&str>) -> Value {
    let all = match body {
        Value::Object(mut map) => map.remove("bookings"),
        other => Some(other),
    };
    let all = match all {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    let total = all.len();
    let kept: Vec<Value> = match business_id {
        Some(id) => all
            .into_iter()
            .filter(|b| b["business_id"].as_str() == Some(id))
            .collect(),
        None => all,
    };
    let other_count = total - kept.len();

    json!({ "bookings": kept, "other_count": other_count })
}
