use axum::{
    extract::{Query, State},
    response::Response,
};
use service_core::AppError;

use crate::handlers::relay;
use crate::models::business::LocationQuery;
use crate::AppState;

/// Businesses near a point, for the main-site "near you" section.
pub async fn nearest_handler(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Response, AppError> {
    let location = query
        .coordinates()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("lat and lng required")))?;

    let reply = state.backend.nearest_businesses(location).await?;
    Ok(relay(reply))
}
