//! Webhook signature verification (HMAC-SHA256).
//!
//! GitHub signs each delivery with the shared webhook secret and sends the
//! result in `X-Hub-Signature-256` as `sha256=<hex>`. Verification runs over
//! the raw request bytes, before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Outcome of checking a delivery against the configured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// No secret is configured, so nothing was checked.
    Unchecked,
    /// The header matches the HMAC of the payload.
    Valid,
    /// A secret is configured but the delivery carried no signature header.
    Missing,
    /// The header is malformed or does not match the payload.
    Mismatch,
}

impl SignatureCheck {
    pub fn is_acceptable(self) -> bool {
        matches!(self, SignatureCheck::Unchecked | SignatureCheck::Valid)
    }
}

/// Checks a delivery. `secret` is `None` when verification is disabled.
///
/// ```
/// use pullrequestd::webhooks::{check_signature, compute_signature, format_signature_header, SignatureCheck};
///
/// let payload = br#"{"action":"opened"}"#;
/// let header = format_signature_header(&compute_signature(payload, b"s3cret"));
///
/// assert_eq!(check_signature(payload, Some(&header), Some(b"s3cret")), SignatureCheck::Valid);
/// assert_eq!(check_signature(payload, None, Some(b"s3cret")), SignatureCheck::Missing);
/// assert_eq!(check_signature(payload, Some(&header), Some(b"other")), SignatureCheck::Mismatch);
/// assert_eq!(check_signature(payload, None, None), SignatureCheck::Unchecked);
/// ```
pub fn check_signature(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: Option<&[u8]>,
) -> SignatureCheck {
    let Some(secret) = secret else {
        return SignatureCheck::Unchecked;
    };
    match signature_header {
        None => SignatureCheck::Missing,
        Some(header) if verify_signature(payload, header, secret) => SignatureCheck::Valid,
        Some(_) => SignatureCheck::Mismatch,
    }
}

/// Parses `sha256=<hex>` into raw bytes. `None` for a missing prefix or bad hex.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.strip_prefix("sha256=")?).ok()
}

/// HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a header value, `sha256=<hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies `signature_header` against the payload in constant time.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
