use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::VoteError;

/// Anonymous credential tokens: minimal HS256 JWT.
///
/// Notes:
/// - Only supports JSON objects for header/payload.
/// - Uses base64url encoding WITHOUT padding.
/// - Performs signature verification using `Hmac::verify_slice`.
///
/// The payload carries an opaque random identifier and a time box, nothing
/// else. Authenticity is checked without a database round-trip; single-use
/// enforcement is deferred to the vote ledger.

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Opaque random identifier, unconnected to any phone data.
    pub sub: String,
    /// Unix timestamp (seconds).
    pub iat: i64,
    /// Unix timestamp (seconds).
    pub exp: i64,
}

fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn b64url_decode(s: &str) -> Result<Vec<u8>, VoteError> {
    URL_SAFE_NO_PAD
        .decode(s.as_bytes())
        .map_err(|_| VoteError::InvalidCredential)
}

/// Sign a fresh credential for `opaque_id`.
pub fn issue(secret: &[u8], opaque_id: &str, now: i64, ttl_secs: i64) -> Result<String, VoteError> {
    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = CredentialClaims {
        sub: opaque_id.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };

    let header_json = serde_json::to_vec(&header)
        .map_err(|e| VoteError::Internal(format!("Failed to serialize credential header: {e}")))?;
    let claims_json = serde_json::to_vec(&claims)
        .map_err(|e| VoteError::Internal(format!("Failed to serialize credential claims: {e}")))?;

    let header_b64 = b64url_encode(&header_json);
    let claims_b64 = b64url_encode(&claims_json);
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| VoteError::Internal(format!("Invalid HMAC key: {e}")))?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();
    let sig_b64 = b64url_encode(&signature);

    Ok(format!("{signing_input}.{sig_b64}"))
}

/// Verify a credential and return its opaque identifier.
///
/// Fails closed: bad signature, malformed structure, unexpected header, and
/// expiry all collapse into `InvalidCredential`.
pub fn validate(secret: &[u8], token: &str, now: i64) -> Result<String, VoteError> {
    let token = token.replace(char::is_whitespace, "");
    let mut parts = token.split('.');
    let Some(header_b64) = parts.next() else {
        return Err(VoteError::InvalidCredential);
    };
    let Some(payload_b64) = parts.next() else {
        return Err(VoteError::InvalidCredential);
    };
    let Some(sig_b64) = parts.next() else {
        return Err(VoteError::InvalidCredential);
    };
    if parts.next().is_some() {
        return Err(VoteError::InvalidCredential);
    }

    let header_raw = b64url_decode(header_b64)?;
    let header: JwtHeader =
        serde_json::from_slice(&header_raw).map_err(|_| VoteError::InvalidCredential)?;
    if header.alg != "HS256" || header.typ.to_ascii_uppercase() != "JWT" {
        return Err(VoteError::InvalidCredential);
    }

    let signing_input = format!("{header_b64}.{payload_b64}");
    let sig = b64url_decode(sig_b64)?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| VoteError::Internal(format!("Invalid HMAC key: {e}")))?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&sig)
        .map_err(|_| VoteError::InvalidCredential)?;

    let payload_raw = b64url_decode(payload_b64)?;
    let claims: CredentialClaims =
        serde_json::from_slice(&payload_raw).map_err(|_| VoteError::InvalidCredential)?;

    if claims.exp <= now {
        return Err(VoteError::InvalidCredential);
    }
    if claims.sub.is_empty() {
        return Err(VoteError::InvalidCredential);
    }

    Ok(claims.sub)
}
