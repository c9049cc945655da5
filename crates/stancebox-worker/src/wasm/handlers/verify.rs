use serde::Deserialize;
use worker::{Env, Request, Response, Result};

use crate::ratelimit::DbCounterStore;
use crate::worker_wasm::brevo::BrevoTransport;
use crate::worker_wasm::db::db_connect;
use crate::worker_wasm::env::load_config;
use crate::worker_wasm::http::{error_response, internal_error_response, json_with_cors, vote_error_response};
use crate::verify;
use crate::worker_wasm::turnstile::TurnstileVerifier;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestCodeData {
    phone: String,
    #[serde(default)]
    dial_code: String,
    captcha_token: String,
}

pub async fn handle_request_code(mut req: Request, env: &Env) -> Result<Response> {
    let config = match load_config(env) {
        Ok(c) => c,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let captcha = match TurnstileVerifier::from_env(env) {
        Ok(c) => c,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let sms = match BrevoTransport::from_env(env) {
        Ok(s) => s,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: RequestCodeData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in verify/request: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    let counters = DbCounterStore { db: &db };
    match verify::request_code(
        &db,
        &counters,
        &captcha,
        &sms,
        &config,
        &payload.dial_code,
        &payload.phone,
        &payload.captcha_token,
    )
    .await
    {
        Ok(()) => {
            let resp = Response::from_json(&serde_json::json!({ "success": true }))?.with_status(202);
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "verify/request failed", &e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmCodeData {
    phone: String,
    #[serde(default)]
    dial_code: String,
    code: String,
}

pub async fn handle_confirm_code(mut req: Request, env: &Env) -> Result<Response> {
    let config = match load_config(env) {
        Ok(c) => c,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: ConfirmCodeData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in verify/confirm: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    let counters = DbCounterStore { db: &db };
    match verify::confirm_code(
        &db,
        &counters,
        &config,
        &payload.dial_code,
        &payload.phone,
        &payload.code,
    )
    .await
    {
        Ok(credential) => {
            let resp = Response::from_json(&serde_json::json!({
                "success": true,
                "credential": credential,
            }))?;
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "verify/confirm failed", &e),
    }
}
