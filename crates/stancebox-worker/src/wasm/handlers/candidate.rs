use serde::Deserialize;
use worker::{Env, Request, Response, Result};

use crate::notify::{admin_candidate_email, EmailSender};
use crate::worker_wasm::brevo::BrevoTransport;
use crate::worker_wasm::db::db_connect;
use crate::worker_wasm::env::load_config;
use crate::worker_wasm::http::{error_response, internal_error_response, json_with_cors, vote_error_response};
use crate::worker_wasm::tasks::spawn_notify;
use crate::{ballot, candidate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimCandidateData {
    candidate_id: String,
    /// Ballot link token proving "this same phone" without re-verification.
    ballot_token: String,
    contact_phone: Option<String>,
}

pub async fn handle_claim_candidate(mut req: Request, env: &Env) -> Result<Response> {
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: ClaimCandidateData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in candidate/claim: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    let fingerprint = match ballot::link_fingerprint(&db, &payload.ballot_token).await {
        Ok(fp) => fp,
        Err(e) => return vote_error_response(&req, "candidate/claim failed", &e),
    };

    match candidate::claim_candidate(
        &db,
        &payload.candidate_id,
        &fingerprint,
        payload.contact_phone.as_deref(),
    )
    .await
    {
        Ok(()) => {
            let resp = Response::from_json(&serde_json::json!({ "success": true }))?;
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "candidate/claim failed", &e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterCandidateData {
    ballot_token: String,
    name: String,
    region: Option<String>,
    contact_phone: Option<String>,
}

pub async fn handle_register_candidate(mut req: Request, env: &Env) -> Result<Response> {
    let config = match load_config(env) {
        Ok(c) => c,
        Err(e) => return internal_error_response(&req, "Missing configuration", &e),
    };
    let db = match db_connect(env).await {
        Ok(db) => db,
        Err(e) => return internal_error_response(&req, "Failed to open libSQL connection", &e),
    };

    let payload: RegisterCandidateData = match req.json().await {
        Ok(p) => p,
        Err(e) => {
            worker::console_log!("Invalid JSON in candidate/register: {e}");
            return error_response(&req, 400, "invalid_json", "Invalid JSON body");
        }
    };

    let fingerprint = match ballot::link_fingerprint(&db, &payload.ballot_token).await {
        Ok(fp) => fp,
        Err(e) => return vote_error_response(&req, "candidate/register failed", &e),
    };

    match candidate::register_candidate(
        &db,
        &fingerprint,
        &payload.name,
        payload.region.as_deref(),
        payload.contact_phone.as_deref(),
    )
    .await
    {
        Ok(id) => {
            // Admin ping is fire-and-forget; its failure never reaches this
            // response.
            if let Some(admin) = config.admin_notify_email.clone() {
                if let Ok(mailer) = BrevoTransport::from_env(env) {
                    let name = payload.name.clone();
                    spawn_notify("admin candidate notification", async move {
                        let (subject, body) = admin_candidate_email(&name);
                        mailer.send_email(&admin, &subject, &body).await
                    });
                }
            }

            let resp = Response::from_json(&serde_json::json!({
                "success": true,
                "candidateId": id,
            }))?;
            json_with_cors(&req, resp)
        }
        Err(e) => vote_error_response(&req, "candidate/register failed", &e),
    }
}
