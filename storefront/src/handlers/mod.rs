pub mod app;
pub mod auth;
pub mod business;
pub mod nearest;
pub mod tenant;

use crate::services::backend_client::BackendReply;
use axum::{
    response::{IntoResponse, Response},
    Json,
};

/// Pass the backend's status and JSON body through to the client.
pub(crate) fn relay(reply: BackendReply) -> Response {
    (reply.status, Json(reply.body)).into_response()
}
