//! Wire format for refresh tokens.
//!
//! A refresh token is `base64url(payload) "." base64url(tag)` where `payload`
//! is the JSON serialization of [`RefreshPayload`] and `tag` is
//! HMAC-SHA256 over those exact payload bytes. The payload is readable by the
//! client; only its integrity is protected.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeSet;
use subtle::ConstantTimeEq;

use crate::utils::jwt::TokenError;

type HmacSha256 = Hmac<Sha256>;

const SEGMENT_SEPARATOR: char = '.';

/// Fields carried inside a refresh token.
///
/// Field order is part of the format: serde serializes in declaration order
/// and `roles` is a sorted set, so the same payload always yields the same
/// bytes and therefore the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPayload {
    pub sid: String,
    pub sub: String,
    pub roles: BTreeSet<String>,
    pub iat: i64,
    pub exp: i64,
}

pub fn encode_refresh_token(payload: &RefreshPayload, secret: &str) -> Result<String, TokenError> {
    let payload_bytes =
        serde_json::to_vec(payload).map_err(|e| TokenError::Encoding(e.to_string()))?;
    let tag = compute_tag(&payload_bytes, secret)?;

    Ok(format!(
        "{}{}{}",
        URL_SAFE_NO_PAD.encode(&payload_bytes),
        SEGMENT_SEPARATOR,
        URL_SAFE_NO_PAD.encode(tag)
    ))
}

/// Splits, authenticates and parses a refresh token, then checks `now <= exp`.
///
/// The tag is checked before the payload is parsed, so unauthenticated bytes
/// never reach the JSON decoder.
pub fn decode_refresh_token(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<RefreshPayload, TokenError> {
    let (payload_part, tag_part) = token
        .split_once(SEGMENT_SEPARATOR)
        .ok_or(TokenError::Malformed)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_part)
        .map_err(|_| TokenError::Malformed)?;
    let supplied_tag = URL_SAFE_NO_PAD
        .decode(tag_part)
        .map_err(|_| TokenError::Malformed)?;

    let expected_tag = compute_tag(&payload_bytes, secret)?;
    if !constant_time_eq(&expected_tag, &supplied_tag) {
        return Err(TokenError::InvalidSignature);
    }

    let payload: RefreshPayload =
        serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;
    if now.timestamp() > payload.exp {
        return Err(TokenError::Expired);
    }
    Ok(payload)
}

fn compute_tag(payload: &[u8], secret: &str) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| TokenError::Encoding(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Compares two byte strings in constant time. Slices of different length
/// compare unequal.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
