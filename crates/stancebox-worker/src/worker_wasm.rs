use worker::*;

#[path = "wasm/brevo.rs"]
pub mod brevo;
#[path = "wasm/db.rs"]
pub mod db;
#[path = "wasm/env.rs"]
pub mod env;
#[path = "wasm/handlers/mod.rs"]
pub mod handlers;
#[path = "wasm/http.rs"]
pub mod http;
#[path = "wasm/kv.rs"]
pub mod kv;
#[path = "wasm/lookup.rs"]
pub mod lookup;
#[path = "wasm/tasks.rs"]
pub mod tasks;
#[path = "wasm/turnstile.rs"]
pub mod turnstile;

use http::{json_with_cors, not_found};

#[event(fetch)]
pub async fn fetch(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    if req.method() == Method::Options {
        let resp = Response::empty()?.with_status(204);
        return json_with_cors(&req, resp);
    }

    let url = req.url()?;
    let path = url.path();

    if req.method() == Method::Get && path == "/health" {
        let body = serde_json::json!({
            "ok": true,
            "service": "stancebox",
        });
        let resp = Response::from_json(&body)?;
        return json_with_cors(&req, resp);
    }

    // Interactive phone-verify flow.
    if req.method() == Method::Post && path == "/api/verify/request" {
        return handlers::verify::handle_request_code(req, &env).await;
    }
    if req.method() == Method::Post && path == "/api/verify/confirm" {
        return handlers::verify::handle_confirm_code(req, &env).await;
    }
    if req.method() == Method::Post && path == "/api/vote" {
        return handlers::vote::handle_cast_vote(req, &env).await;
    }

    // Ballot link flow. The send/redeem routes must be matched before the
    // "/api/ballot/<token>" status probe.
    if req.method() == Method::Post && path == "/api/ballot/send" {
        return handlers::ballot::handle_send_ballot_link(req, &env).await;
    }
    if req.method() == Method::Post && path == "/api/ballot/redeem" {
        return handlers::ballot::handle_redeem_ballot_link(req, &env).await;
    }
    if let Some(rest) = path.strip_prefix("/api/ballot/") {
        if req.method() == Method::Get {
            let token = rest.split('/').next().unwrap_or("").to_string();
            return handlers::ballot::handle_check_ballot_link(req, &env, token).await;
        }
    }

    // Candidate directory.
    if req.method() == Method::Post && path == "/api/candidate/claim" {
        return handlers::candidate::handle_claim_candidate(req, &env).await;
    }
    if req.method() == Method::Post && path == "/api/candidate/register" {
        return handlers::candidate::handle_register_candidate(req, &env).await;
    }

    if req.method() == Method::Post && path == "/api/optout" {
        return handlers::optout::handle_opt_out(req, &env).await;
    }

    if req.method() == Method::Post && path == "/v1/admin/migrations/up" {
        return handlers::migrations::handle_migrations_up(&req, &env).await;
    }
    if req.method() == Method::Get && path == "/v1/admin/db/ping" {
        return handlers::admin::handle_db_ping(&req, &env).await;
    }

    not_found(&req)
}
