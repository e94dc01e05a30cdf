//! Header hints carried inside signed media tokens.
//!
//! Some origins append a `token` query parameter to their CDN URLs. The token
//! is a dot-separated signed payload whose middle segment is base64url JSON,
//! and that JSON may carry a `headers` object the CDN expects to see again.
//! The signature is never checked: the proxy is a pass-through, and the
//! headers are only replayed to the origin that issued them.

use std::collections::BTreeMap;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Name of the query parameter holding the token.
pub const TOKEN_PARAM: &str = "token";

/// Standard alphabet, tolerant of missing padding and stray trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a token could not yield headers.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("no token parameter")]
    Missing,

    #[error("token has fewer than two segments")]
    Malformed,

    #[error("payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no headers object")]
    NoHeaders,
}

/// Extract header overrides embedded in the URL's `token` parameter.
///
/// Never fails: anything unexpected yields an empty map.
pub fn extract_headers(url: &str) -> BTreeMap<String, String> {
    match decode_token_headers(url) {
        Ok(headers) => headers,
        Err(e) => {
            tracing::trace!(error = %e, "No token headers");
            BTreeMap::new()
        }
    }
}

/// Typed variant of [`extract_headers`].
pub fn decode_token_headers(url: &str) -> Result<BTreeMap<String, String>, TokenError> {
    let parsed = Url::parse(url)?;
    let token = parsed
        .query_pairs()
        .find(|(k, _)| k == TOKEN_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or(TokenError::Missing)?;

    let payload = decode_payload(&token)?;
    let headers = payload
        .get("headers")
        .and_then(Value::as_object)
        .ok_or(TokenError::NoHeaders)?;

    Ok(headers
        .iter()
        .filter_map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((name.clone(), value))
        })
        .collect())
}

/// Decode the middle segment of a signed token into JSON.
///
/// A final lone character (length 1 mod 4) carries fewer than eight bits and
/// is dropped.
pub fn decode_payload(token: &str) -> Result<Value, TokenError> {
    let segment = token.split('.').nth(1).ok_or(TokenError::Malformed)?;

    let mut b64: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    if b64.len() % 4 == 1 {
        b64.pop();
    }
    while b64.len() % 4 != 0 {
        b64.push('=');
    }

    let bytes = LENIENT.decode(b64.as_bytes())?;
    Ok(serde_json::from_slice(&bytes)?)
}
