use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use service_core::{AppError, TenancyConfig};

use crate::models::business::BusinessSummary;
use crate::AppState;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}

pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    let site = state.site.url.trim_end_matches('/');
    let body = format!(
        "User-agent: *\n\
         Allow: /\n\
         Disallow: /api/\n\
         Disallow: /admin/\n\
         \n\
         User-agent: Googlebot\n\
         Allow: /\n\
         \n\
         User-agent: Yandexbot\n\
         Allow: /\n\
         \n\
         Host: {site}\n\
         Sitemap: {site}/sitemap.xml\n"
    );

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

pub async fn sitemap(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let businesses = state.backend.list_businesses().await?;
    let xml = render_sitemap(&state.site.url, &state.tenancy, &businesses, Utc::now());

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

/// Main site plus one entry per business storefront. Businesses whose slug
/// fails validation are skipped.
pub fn render_sitemap(
    site_url: &str,
    tenancy: &TenancyConfig,
    businesses: &[BusinessSummary],
    now: DateTime<Utc>,
) -> String {
    let now_str = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    push_url(&mut xml, site_url, &now_str, "daily", "1.0");

    for business in businesses {
        let slug = match tenancy.validate_tenant_slug(&business.tenant_url) {
            Ok(slug) => slug,
            Err(e) => {
                tracing::warn!(tenant_url = %business.tenant_url, error = %e, "Skipping business in sitemap");
                continue;
            }
        };

        let lastmod = business
            .updated_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| now_str.clone());

        push_url(
            &mut xml,
            &tenancy.tenant_url(&slug, ""),
            &lastmod,
            "weekly",
            "0.8",
        );
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    xml.push_str(&format!(
        "  <url><loc>{loc}</loc><lastmod>{lastmod}</lastmod>\
         <changefreq>{changefreq}</changefreq><priority>{priority}</priority></url>\n"
    ));
}
