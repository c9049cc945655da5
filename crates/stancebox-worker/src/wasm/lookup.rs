use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use worker::{Env, Headers, Method, Request, RequestInit};

use crate::error::VoteError;
use crate::screen::{LineType, PhoneTypeScreen};

use super::env::env_string;

#[derive(Debug, Deserialize)]
struct LineTypeIntelligence {
    r#type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    line_type_intelligence: Option<LineTypeIntelligence>,
}

/// Twilio Lookup line-type screen.
///
/// Defense in depth only: when unconfigured it reports `Unknown`, and the
/// ballot path treats any error as `Unknown` too (fail-open).
pub struct TwilioLookup {
    credentials: Option<(String, String)>,
}

impl TwilioLookup {
    pub fn from_env(env: &Env) -> Self {
        let credentials = match (
            env_string(env, "TWILIO_ACCOUNT_SID"),
            env_string(env, "TWILIO_AUTH_TOKEN"),
        ) {
            (Some(sid), Some(token)) => Some((sid, token)),
            _ => None,
        };
        Self { credentials }
    }
}

fn classify_label(label: &str) -> LineType {
    let label = label.to_ascii_lowercase();
    if label == "mobile" {
        LineType::Mobile
    } else if label.contains("voip") {
        LineType::Voip
    } else if label == "landline" {
        LineType::Landline
    } else {
        LineType::Unknown
    }
}

impl PhoneTypeScreen for TwilioLookup {
    async fn classify(&self, e164: &str) -> Result<LineType, VoteError> {
        let Some((sid, token)) = self.credentials.as_ref() else {
            return Ok(LineType::Unknown);
        };

        let url = format!(
            "https://lookups.twilio.com/v2/PhoneNumbers/{e164}?Fields=line_type_intelligence"
        );

        let headers = Headers::new();
        let auth = STANDARD.encode(format!("{sid}:{token}"));
        headers
            .set("Authorization", &format!("Basic {auth}"))
            .map_err(|e| VoteError::Upstream(format!("Failed to build lookup request: {e}")))?;

        let mut init = RequestInit::new();
        init.with_method(Method::Get);
        init.with_headers(headers);

        let req = Request::new_with_init(&url, &init)
            .map_err(|e| VoteError::Upstream(format!("Failed to build lookup request: {e}")))?;

        let mut resp = worker::Fetch::Request(req)
            .send()
            .await
            .map_err(|e| VoteError::Upstream(format!("Number lookup failed: {e}")))?;

        let status = resp.status_code();
        if !(200..=299).contains(&status) {
            return Err(VoteError::Upstream(format!(
                "Number lookup failed (status={status})"
            )));
        }

        let parsed: LookupResult = resp
            .json()
            .await
            .map_err(|e| VoteError::Upstream(format!("Number lookup returned non-JSON: {e}")))?;

        Ok(parsed
            .line_type_intelligence
            .and_then(|i| i.r#type)
            .map(|t| classify_label(&t))
            .unwrap_or(LineType::Unknown))
    }
}
