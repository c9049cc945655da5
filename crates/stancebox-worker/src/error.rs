use thiserror::Error;

/// Failure taxonomy for the voting protocol.
///
/// Terminal states (expired, used, already voted, already claimed) are
/// distinct variants so callers can render them distinctly instead of
/// suggesting a retry that cannot succeed. Database and internal errors are
/// translated to a generic message at the HTTP boundary; no variant carries a
/// raw phone number, fingerprint, or secret.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("invalid request: {0}")]
    Validation(&'static str),

    #[error("captcha verification failed")]
    CaptchaFailed,

    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: i64 },

    #[error("no active verification challenge for this phone")]
    NoActiveChallenge,

    #[error("wrong code, {attempts_left} attempts left")]
    WrongCode { attempts_left: i32 },

    #[error("too many wrong attempts, request a new code")]
    TooManyAttempts,

    #[error("invalid or expired credential")]
    InvalidCredential,

    #[error("a vote has already been cast")]
    AlreadyVoted,

    #[error("not a mobile number")]
    NonMobileNumber,

    #[error("too many pending ballot links for this device")]
    TooManyPendingLinks,

    #[error("ballot link not found")]
    LinkNotFound,

    #[error("ballot link already used")]
    LinkUsed,

    #[error("ballot link expired")]
    LinkExpired,

    #[error("this phone has not voted yet")]
    NotYetVoted,

    #[error("candidate already claimed")]
    AlreadyClaimed,

    #[error("a candidate is already registered for this phone")]
    AlreadyRegistered,

    #[error("this phone has opted out")]
    Suppressed,

    #[error("upstream service unavailable: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

impl VoteError {
    /// Stable machine-readable code for the wire surface.
    pub fn code(&self) -> &'static str {
        match self {
            VoteError::Validation(_) => "invalid_request",
            VoteError::CaptchaFailed => "captcha_failed",
            VoteError::RateLimited { .. } => "rate_limited",
            VoteError::NoActiveChallenge => "no_active_challenge",
            VoteError::WrongCode { .. } => "wrong_code",
            VoteError::TooManyAttempts => "too_many_attempts",
            VoteError::InvalidCredential => "invalid_credential",
            VoteError::AlreadyVoted => "already_voted",
            VoteError::NonMobileNumber => "non_mobile_number",
            VoteError::TooManyPendingLinks => "too_many_pending_links",
            VoteError::LinkNotFound => "link_not_found",
            VoteError::LinkUsed => "link_used",
            VoteError::LinkExpired => "link_expired",
            VoteError::NotYetVoted => "not_yet_voted",
            VoteError::AlreadyClaimed => "already_claimed",
            VoteError::AlreadyRegistered => "already_registered",
            VoteError::Suppressed => "suppressed",
            VoteError::Upstream(_) => "upstream_unavailable",
            VoteError::Internal(_) | VoteError::Db(_) => "internal_error",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            VoteError::Validation(_)
            | VoteError::CaptchaFailed
            | VoteError::NoActiveChallenge
            | VoteError::WrongCode { .. }
            | VoteError::TooManyAttempts
            | VoteError::NonMobileNumber
            | VoteError::NotYetVoted
            | VoteError::Suppressed => 400,
            VoteError::InvalidCredential => 401,
            VoteError::LinkNotFound => 404,
            VoteError::AlreadyVoted | VoteError::AlreadyClaimed | VoteError::AlreadyRegistered => 409,
            VoteError::LinkUsed | VoteError::LinkExpired => 410,
            VoteError::RateLimited { .. } | VoteError::TooManyPendingLinks => 429,
            VoteError::Upstream(_) => 503,
            VoteError::Internal(_) | VoteError::Db(_) => 500,
        }
    }

    /// True for errors whose detail must not reach the caller.
    pub fn is_internal(&self) -> bool {
        matches!(self, VoteError::Internal(_) | VoteError::Db(_))
    }
}
