//! Tenant resolution from the `Host` header and slug validation.
//!
//! Each business is served from its own subdomain (`<slug>.blyss.uz`, or
//! `<slug>.localhost` in development). Resolution never fails: anything that
//! does not look like a tenant host resolves to "not a tenant".

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_MAIN_DOMAIN: &str = "blyss.uz";
pub const DEFAULT_LOCAL_DOMAIN: &str = "localhost";
pub const DEFAULT_RESERVED_SUBDOMAINS: [&str; 7] =
    ["www", "app", "admin", "api", "cdn", "static", "mail"];

pub const MIN_SLUG_LEN: usize = 2;
pub const MAX_SLUG_LEN: usize = 50;

/// Subdomains kept for platform infrastructure; never tenants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct ReservedSubdomains(HashSet<String>);

impl ReservedSubdomains {
    pub fn contains(&self, subdomain: &str) -> bool {
        self.0.contains(subdomain)
    }
}

impl Default for ReservedSubdomains {
    fn default() -> Self {
        DEFAULT_RESERVED_SUBDOMAINS
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into()
    }
}

impl From<Vec<String>> for ReservedSubdomains {
    fn from(names: Vec<String>) -> Self {
        Self(names.into_iter().collect())
    }
}

/// Resolved identity of an inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantContext {
    /// Empty unless `is_tenant`.
    pub slug: String,
    pub is_tenant: bool,
}

impl TenantContext {
    pub fn none() -> Self {
        Self {
            slug: String::new(),
            is_tenant: false,
        }
    }

    fn tenant(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            is_tenant: true,
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.is_tenant.then_some(self.slug.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("slug must be at least 2 characters")]
    TooShort,
    #[error("slug must be at most 50 characters")]
    TooLong,
    #[error("slug contains invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("slug must not start or end with a hyphen")]
    HyphenBoundary,
    #[error("slug {0:?} is reserved")]
    Reserved(String),
}

/// A slug that passed validation. Only these are interpolated into backend URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantSlug(String);

impl TenantSlug {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Domains and reserved names used for tenant resolution. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TenancyConfig {
    #[serde(default = "default_main_domain")]
    pub main_domain: String,
    #[serde(default = "default_local_domain")]
    pub local_domain: String,
    #[serde(default)]
    pub reserved_subdomains: ReservedSubdomains,
}

fn default_main_domain() -> String {
    DEFAULT_MAIN_DOMAIN.to_string()
}

fn default_local_domain() -> String {
    DEFAULT_LOCAL_DOMAIN.to_string()
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            main_domain: default_main_domain(),
            local_domain: default_local_domain(),
            reserved_subdomains: ReservedSubdomains::default(),
        }
    }
}

impl TenancyConfig {
    /// Leftmost label of a tenant-shaped host, port ignored.
    ///
    /// `a.b.blyss.uz` yields `a`; deeper labels are not part of the tenant scheme.
    pub fn extract_subdomain<'h>(&self, host: &'h str) -> Option<&'h str> {
        let hostname = host.split(':').next().unwrap_or_default();
        let labels: Vec<&str> = hostname.split('.').collect();
        let count = labels.len();

        let candidate = if count > 2 && labels[count - 2..].join(".") == self.main_domain {
            Some(labels[0])
        } else if count == 2 && labels[1] == self.local_domain {
            Some(labels[0])
        } else {
            None
        };

        candidate.filter(|label| !label.is_empty())
    }

    pub fn resolve_tenant(&self, host: &str) -> TenantContext {
        match self.extract_subdomain(host) {
            Some(slug) if !self.reserved_subdomains.contains(slug) => TenantContext::tenant(slug),
            _ => TenantContext::none(),
        }
    }

    pub fn is_reserved(&self, subdomain: &str) -> bool {
        self.reserved_subdomains.contains(subdomain)
    }

    /// Validate a slug taken from untrusted input (path or query).
    pub fn validate_tenant_slug(&self, slug: &str) -> Result<TenantSlug, SlugError> {
        let len = slug.chars().count();
        if len < MIN_SLUG_LEN {
            return Err(SlugError::TooShort);
        }
        if len > MAX_SLUG_LEN {
            return Err(SlugError::TooLong);
        }
        if let Some(c) = slug
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlugError::InvalidCharacter(c));
        }
        if slug.starts_with('-') || slug.ends_with('-') {
            return Err(SlugError::HyphenBoundary);
        }
        if self.is_reserved(slug) {
            return Err(SlugError::Reserved(slug.to_string()));
        }

        Ok(TenantSlug(slug.to_string()))
    }

    pub fn is_valid_tenant_slug(&self, slug: &str) -> bool {
        self.validate_tenant_slug(slug).is_ok()
    }

    /// Public URL of a tenant storefront.
    pub fn tenant_url(&self, slug: &TenantSlug, path: &str) -> String {
        format!("https://{}.{}{}", slug, self.main_domain, path)
    }
}

/// Internal route path for a tenant request: `/booking` becomes `/<slug>/booking`.
/// The root maps to `/<slug>` so the tenant home route matches.
pub fn tenant_path(slug: &str, path: &str) -> String {
    match path {
        "" | "/" => format!("/{}", slug),
        p if p.starts_with('/') => format!("/{}{}", slug, p),
        p => format!("/{}/{}", slug, p),
    }
}
