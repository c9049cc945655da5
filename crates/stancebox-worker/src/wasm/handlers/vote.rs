use serde::Deserialize;
use worker::{Env, Request, Response, Result};

use crate::ledger;
use crate::worker_wasm::db::db_connect;
use crate::worker_wasm::env::load_config;
use crate::worker_wasm::http::{error_response, internal_error_response, json_with_cors, vote_error_response};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CastVoteData {
    credential: String,
    value: bool,
}

pub async fn handle_cast_vote(mut req: Request, env: &Env) -> Result<Response> {
    let config = match load_config(env) {
        Ok(c) => c,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: CastVoteData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in vote: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    match ledger::cast_vote(&db, &config, &payload.credential, payload.value).await {
        Ok(()) => {
            let resp = Response::from_json(&serde_json::json!({ "success": true }))?;
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "vote failed", &e),
    }
}
