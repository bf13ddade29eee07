use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub type HmacSha256 = Hmac<Sha256>;

/// Key an HMAC-SHA256 instance with `secret`.
pub fn signing_key(secret: &[u8]) -> Result<HmacSha256, anyhow::Error> {
    HmacSha256::new_from_slice(secret).map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))
}

/// Signature over `body || timestamp` with an already keyed MAC.
pub fn sign_with_key(key: &HmacSha256, body: &str, timestamp: &str) -> String {
    let mut mac = key.clone();

    mac.update(body.as_bytes());
    mac.update(timestamp.as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

/// Generate HMAC-SHA256 signature
///
/// Format: HMAC-SHA256(body || timestamp, secret), lowercase hex.
/// The timestamp is appended to the body with no separator.
pub fn generate_signature(
    secret: &[u8],
    body: &str,
    timestamp: &str,
) -> Result<String, anyhow::Error> {
    let key = signing_key(secret)?;
    Ok(sign_with_key(&key, body, timestamp))
}

/// Verify HMAC-SHA256 signature using constant-time comparison
pub fn verify_signature(
    secret: &[u8],
    body: &str,
    timestamp: &str,
    signature: &str,
) -> Result<bool, anyhow::Error> {
    let expected_signature = generate_signature(secret, body, timestamp)?;

    let expected_bytes = expected_signature.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(signature_bytes).into())
}
