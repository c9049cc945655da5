use entity::ballot_link::ROLE_CANDIDATE;

use crate::error::VoteError;

/// Out-of-band SMS transport.
pub trait SmsSender {
    async fn send_sms(&self, to_e164: &str, text: &str) -> Result<(), VoteError>;
}

/// Email transport, used for admin notifications only.
pub trait EmailSender {
    async fn send_email(&self, to: &str, subject: &str, text: &str) -> Result<(), VoteError>;
}

pub fn verification_code_sms(code: &str) -> String {
    format!("{code} is your voting verification code. It expires in 10 minutes.")
}

/// Role-specific landing URL carried inside a ballot link SMS.
pub fn ballot_url(base_url: &str, token: &str, role: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if role == ROLE_CANDIDATE {
        format!("{base}/ballot?t={token}&as=candidate")
    } else {
        format!("{base}/ballot?t={token}")
    }
}

pub fn ballot_link_sms(base_url: &str, token: &str, role: &str) -> String {
    let url = ballot_url(base_url, token, role);
    if role == ROLE_CANDIDATE {
        format!("Take a public stance as a candidate: {url} (link is personal and valid for 12 hours)")
    } else {
        format!("Cast your stance here: {url} (link is personal and valid for 12 hours)")
    }
}

/// Admin ping on a new candidate entry. Dispatched fire-and-forget; a
/// transport failure is logged and never fails the triggering request.
pub fn admin_candidate_email(candidate_name: &str) -> (String, String) {
    (
        "New candidate registration".to_string(),
        format!("Candidate \"{candidate_name}\" was just registered and awaits verification."),
    )
}
