//! Short-lived HS256 tokens minted from a split credential.
//!
//! The upstream expects a compact JWT: base64url (no padding) header and
//! claims joined by `.`, followed by the HMAC-SHA256 signature of that
//! string keyed with the secret key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use super::SplitCredential;
use crate::constants::{TOKEN_NOT_BEFORE_SKEW_SECS, TOKEN_TTL_SECS};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to encode token segment: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid signing key")]
    InvalidKey,
}

#[derive(Debug, Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    exp: i64,
    nbf: i64,
}

/// Mint a token for `credential` valid from `now - 5s` until `now + 120s`.
///
/// Pure in its inputs: the same credential and clock reading always give
/// the same token.
pub fn mint_token(credential: &SplitCredential, now: i64) -> Result<String, TokenError> {
    let header = serde_json::to_vec(&JwtHeader {
        alg: "HS256",
        typ: "JWT",
    })?;
    let claims = serde_json::to_vec(&JwtClaims {
        iss: &credential.access_key,
        exp: now + TOKEN_TTL_SECS,
        nbf: now - TOKEN_NOT_BEFORE_SKEW_SECS,
    })?;

    let unsigned = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(claims)
    );

    let mut mac = HmacSha256::new_from_slice(credential.secret_key.as_bytes())
        .map_err(|_| TokenError::InvalidKey)?;
    mac.update(unsigned.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{unsigned}.{signature}"))
}

/// Current Unix time in seconds
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
