use serde::Serialize;
use worker::{Env, Headers, Method, Request, RequestInit};

use crate::error::VoteError;
use crate::notify::{EmailSender, SmsSender};

use super::env::env_string;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    text_content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendSmsBody {
    sender: String,
    recipient: String,
    content: String,
    r#type: &'static str,
}

fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Brevo transactional SMS + email transport.
///
/// Owns its configuration strings so sends can be moved into detached
/// notification tasks.
#[derive(Clone)]
pub struct BrevoTransport {
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
    sms_sender: String,
}

impl BrevoTransport {
    pub fn from_env(env: &Env) -> Result<Self, worker::Error> {
        let require = |key: &str| -> Result<String, worker::Error> {
            env_string(env, key).ok_or_else(|| worker::Error::RustError(format!("{key} is required")))
        };

        Ok(Self {
            api_key: require("BREVO_API_KEY")?,
            sender_email: require("BREVO_SENDER_EMAIL")?,
            sender_name: env_string(env, "BREVO_SENDER_NAME"),
            // Alphanumeric sender shown on the recipient's phone, max 11 chars.
            sms_sender: env_string(env, "BREVO_SMS_SENDER").unwrap_or_else(|| "stancebox".to_string()),
        })
    }

    async fn post_json(&self, url: &str, json: String) -> Result<(), VoteError> {
        let headers = Headers::new();
        let set = |h: &Headers, k: &str, v: &str| {
            h.set(k, v)
                .map_err(|e| VoteError::Upstream(format!("Failed to build Brevo request: {e}")))
        };
        set(&headers, "api-key", &self.api_key)?;
        set(&headers, "Content-Type", "application/json")?;
        set(&headers, "Accept", "application/json")?;
        set(&headers, "User-Agent", "Stancebox/0.1 (Cloudflare Worker)")?;

        let mut init = RequestInit::new();
        init.with_method(Method::Post);
        init.with_headers(headers);
        init.with_body(Some(json.into()));

        let req = Request::new_with_init(url, &init)
            .map_err(|e| VoteError::Upstream(format!("Failed to build Brevo request: {e}")))?;

        let mut resp = worker::Fetch::Request(req)
            .send()
            .await
            .map_err(|e| VoteError::Upstream(format!("Brevo request failed: {e}")))?;

        let status = resp.status_code();
        if is_success_status(status) {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(VoteError::Upstream(format!(
            "Brevo send failed (status={status}): {body}"
        )))
    }
}

impl SmsSender for BrevoTransport {
    async fn send_sms(&self, to_e164: &str, text: &str) -> Result<(), VoteError> {
        let body = BrevoSendSmsBody {
            sender: self.sms_sender.clone(),
            recipient: to_e164.to_string(),
            content: text.to_string(),
            r#type: "transactional",
        };

        let json = serde_json::to_string(&body)
            .map_err(|e| VoteError::Internal(format!("Failed to serialize Brevo payload: {e}")))?;

        self.post_json("https://api.brevo.com/v3/transactionalSMS/sms", json)
            .await
    }
}

impl EmailSender for BrevoTransport {
    async fn send_email(&self, to: &str, subject: &str, text: &str) -> Result<(), VoteError> {
        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![BrevoEmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            text_content: text.to_string(),
        };

        let json = serde_json::to_string(&body)
            .map_err(|e| VoteError::Internal(format!("Failed to serialize Brevo payload: {e}")))?;

        self.post_json("https://api.brevo.com/v3/smtp/email", json).await
    }
}
