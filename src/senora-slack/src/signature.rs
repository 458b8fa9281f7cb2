//! Slack request signing (`v0` scheme).
//!
//! Slack signs every request with `v0=hex(hmac_sha256(secret, "v0:{ts}:{body}"))`
//! and sends the result in `X-Slack-Signature`, with the timestamp in
//! `X-Slack-Request-Timestamp`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{SlackError, SlackResult};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
/// Header carrying the request timestamp.
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
/// Maximum accepted clock skew, in seconds.
pub const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

const VERSION: &str = "v0";

fn mac(secret: &str, timestamp: &str, body: &[u8]) -> SlackResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SlackError::SignatureVerification(e.to_string()))?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

/// Compute the `v0=...` signature for a request.
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> SlackResult<String> {
    let digest = mac(secret, timestamp, body)?.finalize().into_bytes();
    Ok(format!("{}={}", VERSION, hex::encode(digest)))
}

/// Verify a request signature against the signing secret.
///
/// `now` is the current Unix time; requests older (or newer) than
/// [`MAX_REQUEST_AGE_SECS`] are rejected to stop replays.
pub fn verify_signature(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now: i64,
) -> SlackResult<()> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SlackError::SignatureVerification("Invalid timestamp".to_string()))?;
    if (now - ts).abs() > MAX_REQUEST_AGE_SECS {
        return Err(SlackError::SignatureVerification(
            "Request timestamp outside the allowed window".to_string(),
        ));
    }

    let provided = signature
        .strip_prefix("v0=")
        .and_then(|h| hex::decode(h).ok())
        .ok_or_else(|| SlackError::SignatureVerification("Malformed signature".to_string()))?;

    mac(secret, timestamp, body)?
        .verify_slice(&provided)
        .map_err(|_| SlackError::SignatureVerification("Signature mismatch".to_string()))
}
