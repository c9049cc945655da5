use serde::Deserialize;
use worker::{Env, Request, Response, Result};

use entity::phone_suppression::SCOPE_ALL;

use crate::worker_wasm::db::db_connect;
use crate::worker_wasm::http::{error_response, internal_error_response, json_with_cors, vote_error_response};
use crate::{ballot, suppress};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptOutData {
    /// Ballot link token identifying the phone without re-exposing it.
    ballot_token: String,
    reason: Option<String>,
}

/// Permanent opt-out. Idempotent: opting out twice is a success, not an
/// error.
pub async fn handle_opt_out(mut req: Request, env: &Env) -> Result<Response> {
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: OptOutData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in optout: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    let fingerprint = match ballot::link_fingerprint(&db, &payload.ballot_token).await {
        Ok(fp) => fp,
        Err(e) => return vote_error_response(&req, "optout failed", &e),
    };

    match suppress::suppress(&db, &fingerprint, SCOPE_ALL, payload.reason.as_deref()).await {
        Ok(()) => {
            let resp = Response::from_json(&serde_json::json!({ "success": true }))?;
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "optout failed", &e),
    }
}
