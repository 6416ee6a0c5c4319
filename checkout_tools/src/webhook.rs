//! Webhook signature verification.
//!
//! The processor signs every callback with the endpoint's webhook secret and sends the result in a header of the form
//!
//! ```text
//! Stripe-Signature: t=1492774577,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! `v1` is the hex HMAC-SHA256 of `"{t}.{raw request body}"`. More than one `v1` may be present while a secret is being
//! rolled; any match is accepted. Signatures whose timestamp is further than the tolerance from the current time are
//! rejected so that captured requests cannot be replayed later.
use chrono::{DateTime, Duration, Utc};
use hmac::Mac;
use log::*;

use crate::{helpers::signed_payload_mac, WebhookEvent, WebhookSignatureError};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const DEFAULT_TOLERANCE: Duration = Duration::seconds(300);

/// Checks `header` against `payload` using `secret`. A zero `tolerance` disables the timestamp check.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), WebhookSignatureError> {
    if secret.is_empty() {
        return Err(WebhookSignatureError::MissingSecret);
    }
    let (timestamp, signatures) = parse_header(header)?;
    // The timestamp comes straight from the request, so the difference must not overflow
    if tolerance > Duration::zero() && now.timestamp().abs_diff(timestamp) > tolerance.num_seconds().unsigned_abs() {
        debug!("🔏️ Signature timestamp {timestamp} is outside the tolerance window");
        return Err(WebhookSignatureError::TimestampOutsideTolerance);
    }
    let mac = signed_payload_mac(secret, timestamp, payload);
    let matched = signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if matched {
        trace!("🔏️ Webhook signature verified");
        Ok(())
    } else {
        Err(WebhookSignatureError::SignatureMismatch)
    }
}

/// Verifies the signature, and only then parses the payload.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<WebhookEvent, WebhookSignatureError> {
    verify_signature(payload, header, secret, tolerance, Utc::now())?;
    serde_json::from_slice(payload).map_err(|e| WebhookSignatureError::InvalidPayload(e.to_string()))
}

/// Produces a signature header for `payload`, as the processor would.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mac = signed_payload_mac(secret, timestamp, payload);
    let sig = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={sig}")
}

fn parse_header(header: &str) -> Result<(i64, Vec<Vec<u8>>), WebhookSignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or_else(|| WebhookSignatureError::MalformedHeader(format!("'{part}' is not a key=value pair")))?;
        match key {
            "t" => {
                let t = value
                    .parse::<i64>()
                    .map_err(|e| WebhookSignatureError::MalformedHeader(format!("Invalid timestamp. {e}")))?;
                timestamp = Some(t);
            },
            // Undecodable signatures can never match, so they are skipped rather than failing the whole header
            "v1" => match hex::decode(value) {
                Ok(sig) => signatures.push(sig),
                Err(e) => debug!("🔏️ Ignoring undecodable v1 signature. {e}"),
            },
            _ => trace!("🔏️ Ignoring signature scheme {key}"),
        }
    }
    let timestamp = timestamp.ok_or_else(|| WebhookSignatureError::MalformedHeader("Missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(WebhookSignatureError::NoSignatures);
    }
    Ok((timestamp, signatures))
}
