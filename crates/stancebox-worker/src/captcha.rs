use crate::error::VoteError;

/// Human-verification check gating code requests.
///
/// Security-relevant, so the call site is fail-closed: a verifier error
/// blocks the request rather than waving it through.
pub trait CaptchaVerifier {
    async fn verify(&self, response_token: &str) -> Result<bool, VoteError>;
}
