use crate::error::VoteError;

/// Line type reported by the external phone lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Mobile,
    Voip,
    Landline,
    Unknown,
}

/// External classification of a phone number.
///
/// Defense in depth only: callers treat a lookup error as `Unknown` and let
/// the request through (fail-open).
pub trait PhoneTypeScreen {
    async fn classify(&self, e164: &str) -> Result<LineType, VoteError>;
}
