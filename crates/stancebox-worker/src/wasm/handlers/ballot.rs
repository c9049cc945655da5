use serde::Deserialize;
use worker::{Env, Request, Response, Result};

use entity::ballot_link::ROLE_VOTER;

use crate::ballot;
use crate::ballot::BallotStatus;
use crate::ratelimit::DbCounterStore;
use crate::worker_wasm::brevo::BrevoTransport;
use crate::worker_wasm::db::db_connect;
use crate::worker_wasm::env::load_config;
use crate::worker_wasm::http::{error_response, internal_error_response, json_with_cors, vote_error_response};
use crate::worker_wasm::kv::KvSlotStore;
use crate::worker_wasm::lookup::TwilioLookup;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendBallotLinkData {
    phone: String,
    #[serde(default)]
    dial_code: String,
    device_id: Option<String>,
    role: Option<String>,
}

pub async fn handle_send_ballot_link(mut req: Request, env: &Env) -> Result<Response> {
    let config = match load_config(env) {
        Ok(c) => c,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let sms = match BrevoTransport::from_env(env) {
        Ok(s) => s,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let slots = match KvSlotStore::from_env(env) {
        Ok(s) => s,
        Err(e) => return internal_error_response(&req, "Missing KV binding", &e),
    };
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: SendBallotLinkData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in ballot/send: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    let counters = DbCounterStore { db: &db };
    let screen = TwilioLookup::from_env(env);
    let role = payload.role.as_deref().unwrap_or(ROLE_VOTER);

    match ballot::send_ballot_link(
        &db,
        &counters,
        &screen,
        &slots,
        &sms,
        &config,
        &payload.dial_code,
        &payload.phone,
        payload.device_id.as_deref(),
        role,
    )
    .await
    {
        Ok(()) => {
            let resp = Response::from_json(&serde_json::json!({ "success": true }))?.with_status(202);
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "ballot/send failed", &e),
    }
}

pub async fn handle_check_ballot_link(req: Request, env: &Env, token: String) -> Result<Response> {
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    // The probe always answers with a status; only infrastructure failures
    // surface as errors.
    match ballot::check_ballot_link(&db, &token).await {
        Ok(status) => {
            let mut body = serde_json::json!({ "status": status.as_str() });
            if let BallotStatus::Valid { role } = &status {
                body["role"] = serde_json::Value::String(role.clone());
            }
            let resp = Response::from_json(&body)?;
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "ballot/check failed", &e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedeemBallotLinkData {
    token: String,
    value: bool,
}

pub async fn handle_redeem_ballot_link(mut req: Request, env: &Env) -> Result<Response> {
    let slots = match KvSlotStore::from_env(env) {
        Ok(s) => s,
        Err(e) => return internal_error_response(&req, "Missing KV binding", &e),
    };
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: RedeemBallotLinkData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in ballot/redeem: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    match ballot::redeem_ballot_link(&db, &slots, &payload.token, payload.value).await {
        Ok(()) => {
            let resp = Response::from_json(&serde_json::json!({ "success": true }))?;
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "ballot/redeem failed", &e),
    }
}
