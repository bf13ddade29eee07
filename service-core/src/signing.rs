//! Outbound request signing for calls from the web tier to the backend API.
//!
//! Every outbound request carries two headers: `x-timestamp` (Unix seconds,
//! base-10) and `x-signature` (lowercase hex HMAC-SHA256 of `body + timestamp`).
//! The backend recomputes the same HMAC with the shared secret and rejects
//! mismatches or stale timestamps.

use crate::utils::clock::{Clock, SystemClock};
use crate::utils::signature::{HmacSha256, sign_with_key, signing_key};
use http::{HeaderMap, HeaderValue, Method, header};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use thiserror::Error;

/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Header carrying the hex HMAC digest.
pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("API signing secret is empty")]
    EmptySecret,
    #[error("API signing secret rejected: {0}")]
    InvalidKey(String),
}

/// Timestamp and signature computed for one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub timestamp: String,
    pub signature: String,
}

/// Transport-agnostic description of a request about to be sent to the backend.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// POST with an already JSON-encoded body.
    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::new(Method::POST, url)
        }
    }

    /// Adds `Authorization: Bearer <token>`. Tokens that are not valid header
    /// values are dropped.
    pub fn with_bearer(mut self, token: &str) -> Self {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                self.headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Dropping bearer token that is not a valid header value"),
        }
        self
    }

    /// Payload as signed: the body text, or the empty string when there is none.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }
}

/// Signs outbound requests with the process-wide API secret, keyed once at startup.
#[derive(Clone)]
pub struct RequestSigner {
    key: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Refuses to build a signer around an empty secret: every signature it
    /// produced would be predictable.
    pub fn new(secret: Secret<String>, clock: Arc<dyn Clock>) -> Result<Self, SigningError> {
        if secret.expose_secret().is_empty() {
            return Err(SigningError::EmptySecret);
        }
        let key = signing_key(secret.expose_secret().as_bytes())
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        Ok(Self { key, clock })
    }

    pub fn with_system_clock(secret: Secret<String>) -> Result<Self, SigningError> {
        Self::new(secret, Arc::new(SystemClock))
    }

    /// Sign `body` at the current clock reading.
    pub fn sign(&self, body: &str) -> SignedEnvelope {
        let timestamp = self.clock.now_unix().to_string();
        self.sign_at(body, &timestamp)
    }

    /// Sign `body` at an explicit timestamp. Pure given its inputs.
    pub fn sign_at(&self, body: &str, timestamp: &str) -> SignedEnvelope {
        let signature = sign_with_key(&self.key, body, timestamp);

        SignedEnvelope {
            timestamp: timestamp.to_string(),
            signature,
        }
    }

    /// Returns a signed copy of `request`; the caller's request is left untouched.
    pub fn attach_signature(&self, request: &OutboundRequest) -> OutboundRequest {
        let envelope = self.sign(request.body_text());
        let mut signed = request.clone();

        // Both values are ASCII digits / hex, always valid header values.
        if let Ok(value) = HeaderValue::from_str(&envelope.timestamp) {
            signed.headers.insert(TIMESTAMP_HEADER, value);
        }
        if let Ok(value) = HeaderValue::from_str(&envelope.signature) {
            signed.headers.insert(SIGNATURE_HEADER, value);
        }

        if !request.body_text().is_empty() {
            signed.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        signed
    }
}
