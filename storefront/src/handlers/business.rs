//! Main-site business pages addressed by path (`/b/<slug>`).
//!
//! The slug is user-controlled here, unlike the Host-derived slug on tenant
//! subdomains, so it is validated before any backend call.

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use service_core::AppError;

use crate::handlers::relay;
use crate::models::business::LocationQuery;
use crate::AppState;

pub async fn business_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let slug = state.tenancy.validate_tenant_slug(&slug)?;
    let reply = state.backend.business_services(&slug, None).await?;
    Ok(relay(reply))
}

pub async fn business_services(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LocationQuery>,
) -> Result<Response, AppError> {
    let slug = state.tenancy.validate_tenant_slug(&slug)?;
    let reply = state
        .backend
        .business_services(&slug, query.coordinates())
        .await?;
    Ok(relay(reply))
}
