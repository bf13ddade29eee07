//! Phone OTP authentication payloads forwarded to the backend.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(length(min = 9, max = 20, message = "Phone number must be 9-20 characters"))]
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 9, max = 20, message = "Phone number must be 9-20 characters"))]
    pub phone_number: String,
    #[validate(range(max = 999_999, message = "OTP code must have at most 6 digits"))]
    pub otp_code: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "otp_id cannot be empty"))]
    pub otp_id: String,
    #[validate(length(min = 9, max = 20, message = "Phone number must be 9-20 characters"))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Token pair returned by verify-otp (existing users), register and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Non-secret profile stored in the script-readable `blyss_user` cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedUser {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
}
