//! Signed client for the booking backend's public API.
//!
//! Every call is signed with [`RequestSigner::attach_signature`] and carries
//! the current trace context. Upstream status codes are relayed to callers as
//! [`BackendReply`]; only transport failures become errors.

use crate::config::BackendSettings;
use crate::models::auth::{RefreshTokenRequest, RegisterRequest, SendOtpRequest, VerifyOtpRequest};
use crate::models::booking::{CreateBookingRequest, SlotEmployeesQuery, SlotQuery};
use crate::models::business::{BusinessSummary, Coordinates};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use service_core::observability::inject_trace_context;
use service_core::{AppError, OutboundRequest, RequestSigner, TenantSlug};
use std::time::Duration;

const NEAREST_PAGE_SIZE: &str = "50";
const NEAREST_RADIUS: &str = "1000";

/// Status and JSON body returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: Value,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub struct BackendClient {
    client: Client,
    base_url: Url,
    signer: RequestSigner,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings, signer: RequestSigner) -> anyhow::Result<Self> {
        let base_url = Url::parse(&settings.url)
            .map_err(|e| anyhow::anyhow!("Invalid backend URL {}: {}", settings.url, e))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url,
            signer,
        })
    }

    /// Build `<base>/public/<segments...>?<query>`. Segments are percent-encoded.
    fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InternalError(anyhow::anyhow!("Backend URL cannot be a base")))?
            .pop_if_empty()
            .push("public")
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k, v.as_str())));
        }

        Ok(url)
    }

    async fn send(&self, request: OutboundRequest) -> Result<BackendReply, AppError> {
        let signed = self.signer.attach_signature(&request);

        let mut headers = signed.headers;
        inject_trace_context(&mut headers);

        let mut builder = self
            .client
            .request(signed.method.clone(), &signed.url)
            .headers(headers);
        if let Some(body) = signed.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(method = %signed.method, url = %signed.url, error = %e, "Backend request failed");
            AppError::BadGateway(format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::error!(url = %signed.url, error = %e, "Failed to read backend response");
            AppError::BadGateway(format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            tracing::warn!(url = %signed.url, status = %status, "Backend returned an error status");
        }

        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(BackendReply { status, body })
    }

    async fn get(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        access_token: Option<&str>,
    ) -> Result<BackendReply, AppError> {
        let mut request = OutboundRequest::get(self.url(segments, query)?);
        if let Some(token) = access_token {
            request = request.with_bearer(token);
        }
        self.send(request).await
    }

    async fn post<T: Serialize>(
        &self,
        segments: &[&str],
        payload: &T,
        access_token: Option<&str>,
    ) -> Result<BackendReply, AppError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to encode body: {}", e)))?;

        let mut request = OutboundRequest::post_json(self.url(segments, &[])?, body);
        if let Some(token) = access_token {
            request = request.with_bearer(token);
        }
        self.send(request).await
    }

    /// All businesses, for the sitemap. Backend errors yield an empty list.
    pub async fn list_businesses(&self) -> Result<Vec<BusinessSummary>, AppError> {
        let reply = self.get(&["businesses"], &[], None).await?;
        if !reply.is_success() {
            return Ok(Vec::new());
        }

        let list = match reply.body {
            Value::Object(mut map) => map
                .remove("businesses")
                .unwrap_or_else(|| Value::Array(Vec::new())),
            other => other,
        };

        Ok(serde_json::from_value(list).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Unexpected business list shape");
            Vec::new()
        }))
    }

    pub async fn business_services(
        &self,
        slug: &TenantSlug,
        location: Option<Coordinates>,
    ) -> Result<BackendReply, AppError> {
        let query = location
            .map(|c| vec![("lat", c.lat.to_string()), ("lng", c.lng.to_string())])
            .unwrap_or_default();
        self.get(&["businesses", slug.as_str(), "services"], &query, None)
            .await
    }

    pub async fn nearest_businesses(&self, location: Coordinates) -> Result<BackendReply, AppError> {
        let query = [
            ("lat", location.lat.to_string()),
            ("lng", location.lng.to_string()),
            ("page_size", NEAREST_PAGE_SIZE.to_string()),
            ("radius", NEAREST_RADIUS.to_string()),
        ];
        self.get(&["businesses", "nearest"], &query, None).await
    }

    pub async fn available_slots(
        &self,
        slug: &TenantSlug,
        slots: &SlotQuery,
    ) -> Result<BackendReply, AppError> {
        let mut query = vec![
            ("date", slots.date.clone()),
            ("service_ids", slots.service_ids.clone()),
        ];
        if let Some(employee_id) = &slots.employee_id {
            query.push(("employee_id", employee_id.clone()));
        }
        self.get(&["businesses", slug.as_str(), "available-slots-v2"], &query, None)
            .await
    }

    pub async fn slot_employees(
        &self,
        slug: &TenantSlug,
        slots: &SlotEmployeesQuery,
    ) -> Result<BackendReply, AppError> {
        let mut query = vec![
            ("date", slots.date.clone()),
            ("service_ids", slots.service_ids.clone()),
            ("start_time", slots.start_time.to_string()),
        ];
        if let Some(employee_id) = &slots.employee_id {
            query.push(("employee_id", employee_id.clone()));
        }
        self.get(&["businesses", slug.as_str(), "slot-employees"], &query, None)
            .await
    }

    pub async fn send_otp(&self, request: &SendOtpRequest) -> Result<BackendReply, AppError> {
        self.post(&["send-otp"], request, None).await
    }

    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<BackendReply, AppError> {
        self.post(&["verify-otp"], request, None).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<BackendReply, AppError> {
        self.post(&["register"], request, None).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<BackendReply, AppError> {
        let request = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post(&["refresh-token"], &request, None).await
    }

    pub async fn me(&self, access_token: &str) -> Result<BackendReply, AppError> {
        self.get(&["me"], &[], Some(access_token)).await
    }

    pub async fn my_bookings(
        &self,
        access_token: &str,
        business_id: Option<&str>,
    ) -> Result<BackendReply, AppError> {
        let query: Vec<(&str, String)> = business_id
            .map(|id| vec![("business_id", id.to_string())])
            .unwrap_or_default();
        self.get(&["my-bookings"], &query, Some(access_token)).await
    }

    pub async fn create_booking(
        &self,
        slug: &TenantSlug,
        access_token: &str,
        booking: &CreateBookingRequest,
    ) -> Result<BackendReply, AppError> {
        self.post(
            &["businesses", slug.as_str(), "bookings-v2"],
            booking,
            Some(access_token),
        )
        .await
    }
}
