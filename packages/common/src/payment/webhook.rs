//! Webhook signature verification.
//!
//! The provider signs `"{timestamp}.{raw_body}"` with HMAC-SHA256 and sends
//! the result in a `Stripe-Signature: t=<ts>,v1=<hex>` header. Verification
//! must run over the literal bytes received on the wire; re-serializing a
//! parsed body is not guaranteed to byte-match the signed payload.

use std::collections::HashMap;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed signature header")]
    BadHeader,

    #[error("signature timestamp outside tolerance")]
    TimestampOutOfTolerance,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("malformed webhook payload: {0}")]
    BadPayload(String),
}

/// A verified, parsed webhook event.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    /// Provider event type, e.g. `payment_intent.succeeded`.
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: IntentObject,
}

/// The payment-intent object embedded in webhook payloads. Only the fields
/// the reconciliation flow reads are modeled.
#[derive(Debug, Deserialize)]
pub struct IntentObject {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Verify `header` against the raw body and parse the event.
pub fn verify_and_parse(
    raw_body: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> Result<WebhookEvent, WebhookError> {
    verify_at(raw_body, header, secret, tolerance_secs, Utc::now().timestamp())?;
    serde_json::from_slice(raw_body).map_err(|e| WebhookError::BadPayload(e.to_string()))
}

/// Verify the signature with an explicit "now", for tolerance checks.
pub fn verify_at(
    raw_body: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), WebhookError> {
    let (timestamp, signatures) = parse_header(header)?;

    if (now - timestamp).abs() > tolerance_secs {
        return Err(WebhookError::TimestampOutOfTolerance);
    }

    // verify_slice is constant-time; accept if any v1 candidate matches.
    for sig in signatures {
        let Ok(sig_bytes) = hex::decode(sig) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| WebhookError::SignatureMismatch)?;
        mac.update(signed_payload(timestamp, raw_body).as_slice());
        if mac.verify_slice(&sig_bytes).is_ok() {
            return Ok(());
        }
    }

    Err(WebhookError::SignatureMismatch)
}

/// Build a `t=...,v1=...` header for a payload. Used by local tooling and
/// tests to emulate provider deliveries.
pub fn signature_header(timestamp: i64, raw_body: &[u8], secret: &str) -> String {
    format!("t={},v1={}", timestamp, compute_signature(timestamp, raw_body, secret))
}

fn signed_payload(timestamp: i64, raw_body: &[u8]) -> Vec<u8> {
    let mut payload = timestamp.to_string().into_bytes();
    payload.push(b'.');
    payload.extend_from_slice(raw_body);
    payload
}

fn compute_signature(timestamp: i64, raw_body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed_payload(timestamp, raw_body).as_slice());
    hex::encode(mac.finalize().into_bytes())
}

fn parse_header(header: &str) -> Result<(i64, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(WebhookError::BadHeader);
        };
        match key {
            "t" => timestamp = Some(value.parse().map_err(|_| WebhookError::BadHeader)?),
            "v1" => signatures.push(value),
            // Unknown schemes (v0 test-mode signatures) are ignored.
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::BadHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::BadHeader);
    }
    Ok((timestamp, signatures))
}
