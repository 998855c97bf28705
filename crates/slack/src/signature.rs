//! Slack request signing (`v0` scheme).
//!
//! Slack signs `v0:{timestamp}:{raw body}` with the app's signing secret and
//! sends the hex digest as `X-Slack-Signature: v0=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::SignatureError;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Requests older (or newer) than this many seconds are rejected as replays.
pub const MAX_TIMESTAMP_SKEW_SECS: u64 = 300;

const SIGNATURE_VERSION: &str = "v0";

/// Checks a request against the signing secret.
///
/// `now_unix_secs` is injected so callers and tests control the clock.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now_unix_secs: u64,
) -> Result<(), SignatureError> {
    let timestamp = timestamp
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SignatureError::MissingHeaders)?;
    let signature = signature
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SignatureError::MissingHeaders)?;

    let sent_at = timestamp
        .parse::<u64>()
        .map_err(|_| SignatureError::MalformedTimestamp)?;
    if now_unix_secs.abs_diff(sent_at) > MAX_TIMESTAMP_SKEW_SECS {
        return Err(SignatureError::Stale);
    }

    let digest_hex = signature
        .strip_prefix("v0=")
        .ok_or(SignatureError::MalformedSignature)?;
    let expected = decode_hex(digest_hex).ok_or(SignatureError::MalformedSignature)?;

    // verify_slice compares in constant time.
    mac_for(signing_secret, timestamp, body)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Computes the `v0=<hex>` signature Slack would send for `body`.
pub fn sign(signing_secret: &str, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
    let digest = mac_for(signing_secret, timestamp, body)?
        .finalize()
        .into_bytes();
    let mut out = String::with_capacity(3 + digest.len() * 2);
    out.push_str(SIGNATURE_VERSION);
    out.push('=');
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}

fn mac_for(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<Hmac<Sha256>, SignatureError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    let raw = value.trim().as_bytes();
    if raw.is_empty() || raw.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(raw.len() / 2);
    for pair in raw.chunks(2) {
        let hex = std::str::from_utf8(pair).ok()?;
        bytes.push(u8::from_str_radix(hex, 16).ok()?);
    }
    Some(bytes)
}
