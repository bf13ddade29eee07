//! Host-based tenant routing.
//!
//! `shop1.blyss.uz/booking` is served by the route template at
//! `/shop1/booking`. The rewrite only changes request dispatch; the client's
//! URL is untouched. This middleware must wrap the router (not be added with
//! `Router::layer`) so the rewritten path is what gets routed.

use axum::{
    extract::{Path, Request, State},
    http::{header::HOST, uri::PathAndQuery, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use service_core::tenancy::{tenant_path, TenancyConfig};
use service_core::TenantContext;
use std::sync::Arc;

use crate::handlers::tenant::tenant_home;
use crate::AppState;

/// Path prefixes that are never rewritten, even on tenant hosts.
const PASSTHROUGH_PREFIXES: [&str; 4] = ["/api", "/static", "/health", "/metrics"];

/// Whether `path` is dispatched to tenant templates when it arrives on a tenant host.
pub fn is_tenant_routable(path: &str) -> bool {
    let has_prefix = PASSTHROUGH_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    });
    let last_segment = path.rsplit('/').next().unwrap_or_default();

    !has_prefix && !last_segment.contains('.')
}

/// Set on requests whose path was rewritten onto a tenant route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRewrite {
    pub original_path: String,
}

fn request_host(req: &Request) -> &str {
    req.headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or_default()
}

fn rewrite_uri(uri: &Uri, slug: &str) -> Result<Uri, axum::http::Error> {
    let path = tenant_path(slug, uri.path());
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

/// Resolve the tenant, record it as a request extension and rewrite tenant paths.
///
/// A request that already carries a `TenantContext` has been through this
/// middleware and is passed on unchanged.
pub async fn tenant_routing_middleware(
    State(tenancy): State<Arc<TenancyConfig>>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<TenantContext>().is_some() {
        return next.run(req).await;
    }

    let ctx = tenancy.resolve_tenant(request_host(&req));

    if ctx.is_tenant {
        tracing::Span::current().record("tenant", ctx.slug.as_str());
    }

    if ctx.is_tenant && is_tenant_routable(req.uri().path()) {
        match rewrite_uri(req.uri(), &ctx.slug) {
            Ok(uri) => {
                tracing::debug!(tenant = %ctx.slug, from = %req.uri(), to = %uri, "Rewriting tenant request");
                let original_path = req.uri().path().to_string();
                *req.uri_mut() = uri;
                req.extensions_mut().insert(TenantRewrite { original_path });
            }
            Err(e) => {
                tracing::warn!(tenant = %ctx.slug, error = %e, "Failed to rewrite tenant path");
            }
        }
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Guards the fixed top-level routes a tenant home can collide with.
///
/// `health` and `metrics` are valid slugs, so `health.blyss.uz/` is rewritten
/// to `/health`. Such a request is served the tenant home instead of the
/// operational endpoint.
pub async fn tenant_home_on_rewrite(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let rewritten = req.extensions().get::<TenantRewrite>().is_some();
    let ctx = req.extensions().get::<TenantContext>().cloned();

    match ctx {
        Some(ctx) if rewritten && ctx.is_tenant => {
            let slug = ctx.slug.clone();
            tenant_home(State(state), Some(Extension(ctx)), Path(slug))
                .await
                .into_response()
        }
        _ => next.run(req).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_paths() {
        assert!(!is_tenant_routable("/api/nearest"));
        assert!(!is_tenant_routable("/api"));
        assert!(!is_tenant_routable("/health"));
        assert!(!is_tenant_routable("/static/app.css"));
        assert!(!is_tenant_routable("/favicon.ico"));
        assert!(!is_tenant_routable("/robots.txt"));
    }

    #[test]
    fn page_paths_are_routable() {
        assert!(is_tenant_routable("/"));
        assert!(is_tenant_routable("/booking"));
        assert!(is_tenant_routable("/apiary"));
        assert!(is_tenant_routable("/healthy-nails"));
    }

    #[test]
    fn rewrite_keeps_query() {
        let uri: Uri = "/slots?date=2025-01-01&service_ids=a,b".parse().unwrap();
        let rewritten = rewrite_uri(&uri, "shop1").unwrap();
        assert_eq!(rewritten.path(), "/shop1/slots");
        assert_eq!(rewritten.query(), Some("date=2025-01-01&service_ids=a,b"));
    }

    #[tokio::test]
    async fn rewrite_is_recorded() {
        use axum::{body::Body, middleware::from_fn_with_state, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .fallback(|Extension(rewrite): Extension<TenantRewrite>| async move {
                rewrite.original_path
            })
            .layer(from_fn_with_state(
                Arc::new(TenancyConfig::default()),
                tenant_routing_middleware,
            ));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/booking")
                    .header(HOST, "shop1.blyss.uz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"/booking");
    }

    #[test]
    fn rewrite_root() {
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(rewrite_uri(&uri, "shop1").unwrap().path(), "/shop1");
    }
}
