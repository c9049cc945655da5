//! Protocol constants and environment-provided configuration.

/// Digits in an SMS verification code.
pub const SMS_CODE_LENGTH: usize = 6;

/// Wrong confirm attempts before a challenge becomes terminally unusable.
pub const SMS_MAX_ATTEMPTS: i32 = 3;

/// Challenge lifetime. Short: the user is sitting in front of the form.
pub const SMS_CODE_TTL_SECS: i64 = 10 * 60;

/// Anonymous credential lifetime. A credential is meant to be spent on the
/// vote submission that immediately follows confirmation.
pub const CREDENTIAL_TTL_SECS: i64 = 5 * 60;

/// Ballot links are delivered out of band and opened later.
pub const BALLOT_LINK_TTL_SECS: i64 = 12 * 3600;

/// Simultaneously pending ballot links one device may hold.
pub const DEVICE_SLOT_CAP: usize = 3;

/// Extra KV retention past link expiry so lazy pruning sees stale entries.
pub const DEVICE_SLOT_TTL_MARGIN_SECS: i64 = 3600;

/// Counter key for limits that apply across all callers.
pub const GLOBAL_KEY: &str = "global";

/// A named sliding-window limit: at most `max` hits per `window_secs`.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    pub bucket: &'static str,
    pub max: i32,
    pub window_secs: i64,
}

pub const RATE_SMS_CODE_PHONE: RateWindow = RateWindow {
    bucket: "sms_code.phone",
    max: 3,
    window_secs: 15 * 60,
};

pub const RATE_SMS_CODE_GLOBAL: RateWindow = RateWindow {
    bucket: "sms_code.global",
    max: 300,
    window_secs: 3600,
};

pub const RATE_CONFIRM_PHONE: RateWindow = RateWindow {
    bucket: "confirm.phone",
    max: 10,
    window_secs: 15 * 60,
};

pub const RATE_BALLOT_PHONE: RateWindow = RateWindow {
    bucket: "ballot.phone",
    max: 3,
    window_secs: 3600,
};

pub const RATE_BALLOT_GLOBAL: RateWindow = RateWindow {
    bucket: "ballot.global",
    max: 500,
    window_secs: 3600,
};

/// Environment-provided secrets and deployment settings.
///
/// `fingerprint_salt` and `credential_secret` must never be logged or echoed
/// back to callers.
#[derive(Clone)]
pub struct Config {
    /// Salt for the one-way phone fingerprint digest.
    pub fingerprint_salt: String,

    /// HS256 signing key for anonymous credentials.
    pub credential_secret: String,

    /// Public base URL the ballot links point at, without trailing slash.
    pub ballot_base_url: String,

    /// Admin notification target; notifications are skipped when unset.
    pub admin_notify_email: Option<String>,
}
