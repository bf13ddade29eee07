use serde::{Deserialize, Serialize};

/// Entry of `GET /public/businesses` as used by the sitemap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSummary {
    /// Tenant slug of the business storefront.
    pub tenant_url: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// `lat`/`lng` query parameters, both optional at the HTTP layer.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationQuery {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}
