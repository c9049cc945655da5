use chrono::Utc;
use getrandom::fill;

use crate::config::SMS_CODE_LENGTH;

pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    fill(&mut out).expect("Failed to generate random bytes");
    out
}

pub fn hex_encode(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(LUT[(b >> 4) as usize] as char);
        out.push(LUT[(b & 0x0f) as usize] as char);
    }
    out
}

/// Unguessable ballot link token.
pub fn generate_link_token() -> String {
    // 256-bit token, hex-encoded.
    hex_encode(&random_bytes(32))
}

/// Opaque identifier for anonymous credentials and row ids.
pub fn generate_opaque_id() -> String {
    // 128-bit id, hex-encoded.
    hex_encode(&random_bytes(16))
}

/// Fixed-length numeric SMS code.
///
/// Rejection sampling keeps the distribution uniform over the full range.
pub fn generate_sms_code() -> String {
    // Largest multiple of 10^6 that fits in a u32.
    const LIMIT: u32 = 4_294_000_000;
    loop {
        let bytes: [u8; 4] = random_bytes(4).try_into().expect("4 random bytes");
        let raw = u32::from_be_bytes(bytes);
        if raw < LIMIT {
            return format!("{:0width$}", raw % 1_000_000, width = SMS_CODE_LENGTH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encode_round_trips_known_bytes() {
        assert_eq!(hex_encode(&[0x00, 0xff, 0x10]), "00ff10");
        assert_eq!(hex_encode(&[]), "");
    }

    #[test]
    fn link_tokens_are_long_and_distinct() {
        let a = generate_link_token();
        let b = generate_link_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sms_codes_are_fixed_length_digits() {
        for _ in 0..100 {
            let code = generate_sms_code();
            assert_eq!(code.len(), SMS_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
