use serde::{Deserialize, Serialize};
use worker::{Env, Headers, Method, Request, RequestInit};

use crate::captcha::CaptchaVerifier;
use crate::error::VoteError;

use super::env::env_string;

#[derive(Debug, Serialize)]
struct SiteverifyBody {
    secret: String,
    response: String,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResult {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Cloudflare Turnstile verifier.
///
/// Security-relevant, so every failure mode (transport, parse, missing
/// secret) surfaces as an error and the caller blocks the request.
pub struct TurnstileVerifier {
    secret: String,
}

impl TurnstileVerifier {
    pub fn from_env(env: &Env) -> Result<Self, worker::Error> {
        let secret = env_string(env, "TURNSTILE_SECRET")
            .ok_or_else(|| worker::Error::RustError("TURNSTILE_SECRET is required".to_string()))?;
        Ok(Self { secret })
    }
}

impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, response_token: &str) -> Result<bool, VoteError> {
        if response_token.trim().is_empty() {
            return Ok(false);
        }

        let body = SiteverifyBody {
            secret: self.secret.clone(),
            response: response_token.to_string(),
        };
        let json = serde_json::to_string(&body)
            .map_err(|e| VoteError::Internal(format!("Failed to serialize siteverify payload: {e}")))?;

        let headers = Headers::new();
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| VoteError::Upstream(format!("Failed to build siteverify request: {e}")))?;

        let mut init = RequestInit::new();
        init.with_method(Method::Post);
        init.with_headers(headers);
        init.with_body(Some(json.into()));

        let req = Request::new_with_init(
            "https://challenges.cloudflare.com/turnstile/v0/siteverify",
            &init,
        )
        .map_err(|e| VoteError::Upstream(format!("Failed to build siteverify request: {e}")))?;

        let mut resp = worker::Fetch::Request(req)
            .send()
            .await
            .map_err(|e| VoteError::Upstream(format!("Turnstile request failed: {e}")))?;

        let parsed: SiteverifyResult = resp
            .json()
            .await
            .map_err(|e| VoteError::Upstream(format!("Turnstile returned non-JSON: {e}")))?;

        if !parsed.success && !parsed.error_codes.is_empty() {
            worker::console_log!("Turnstile rejected token: {:?}", parsed.error_codes);
        }

        Ok(parsed.success)
    }
}
