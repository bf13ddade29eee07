use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    app::{health_check, metrics, robots, sitemap},
    auth::{
        logout_handler, me_handler, my_bookings_handler, refresh_handler, register_handler,
        send_otp_handler, verify_otp_handler,
    },
    business::{business_page, business_services},
    nearest::nearest_handler,
    tenant::{
        available_slots, create_booking, slot_employees, tenant_bookings, tenant_home,
        tenant_services,
    },
};
use crate::middleware::tenant::{tenant_home_on_rewrite, tenant_routing_middleware};
use crate::AppState;

/// Routes as seen after tenant rewriting: tenant pages live under `/:tenant`.
fn routes(state: AppState) -> Router {
    let operational = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route_layer(from_fn_with_state(state.clone(), tenant_home_on_rewrite));

    Router::new()
        .merge(operational)
        .route("/robots.txt", get(robots))
        .route("/sitemap.xml", get(sitemap))
        .route("/api/nearest", get(nearest_handler))
        .route("/api/auth/send-otp", post(send_otp_handler))
        .route("/api/auth/verify-otp", post(verify_otp_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/me", get(me_handler))
        .route("/api/my-bookings", get(my_bookings_handler))
        .route("/b/:slug", get(business_page))
        .route("/b/:slug/services", get(business_services))
        .route("/:tenant", get(tenant_home))
        .route("/:tenant/services", get(tenant_services))
        .route("/:tenant/slots", get(available_slots))
        .route("/:tenant/slot-employees", get(slot_employees))
        .route(
            "/:tenant/bookings",
            get(tenant_bookings).post(create_booking),
        )
        .layer(from_fn(metrics_middleware))
        .with_state(state)
}

pub fn build_router(state: AppState) -> Router {
    // The rewrite has to run before routing, so it wraps the inner router
    // instead of being added with `Router::layer`.
    let tenant_routed = ServiceBuilder::new()
        .layer(from_fn_with_state(
            state.tenancy.clone(),
            tenant_routing_middleware,
        ))
        .service(routes(state));

    Router::new()
        .fallback_service(tenant_routed)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                let host = request
                    .headers()
                    .get(axum::http::header::HOST)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    host = %host,
                    tenant = tracing::field::Empty,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
}
