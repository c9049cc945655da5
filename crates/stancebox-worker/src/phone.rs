use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::VoteError;
use crate::util::hex_encode;

/// Normalize a phone number to E.164 (`+` followed by 8..=15 digits).
///
/// Accepts an already-prefixed international number (`+4512345678`,
/// `004512345678`) or a national number combined with `dial_code`. Common
/// separators are stripped; anything else is rejected.
pub fn normalize_e164(dial_code: &str, phone: &str) -> Result<String, VoteError> {
    let mut cleaned: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();

    if let Some(rest) = cleaned.strip_prefix("00") {
        cleaned = format!("+{rest}");
    }

    let digits = match cleaned.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => {
            let dc: String = dial_code.chars().filter(char::is_ascii_digit).collect();
            if dc.is_empty() {
                return Err(VoteError::Validation("missing dial code"));
            }
            format!("{dc}{cleaned}")
        }
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(VoteError::Validation("phone number must contain only digits"));
    }
    if !(8..=15).contains(&digits.len()) {
        return Err(VoteError::Validation("phone number length out of range"));
    }
    // No country calling code starts with 0.
    if digits.starts_with('0') {
        return Err(VoteError::Validation("invalid country code"));
    }

    Ok(format!("+{digits}"))
}

/// One-way salted digest of a normalized phone number.
///
/// The only durable trace of "which phone". Joins rate limits, suppressions
/// and ballot links; never stored next to a credential-path vote.
pub fn fingerprint(salt: &str, e164: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(salt.as_bytes()).expect("HMAC accepts any key length");
    mac.update(e164.as_bytes());
    hex_encode(&mac.finalize().into_bytes())
}
