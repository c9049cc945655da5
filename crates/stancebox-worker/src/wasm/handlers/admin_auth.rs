use worker::{Env, Request, Result};

use crate::worker_wasm::env::env_string;
use crate::worker_wasm::http::error_response;

pub fn extract_bearer_token(req: &Request) -> Result<Option<String>> {
    let Some(raw) = req.headers().get("Authorization")? else {
        return Ok(None);
    };

    let raw = raw.trim();
    let Some((scheme, rest)) = raw.split_once(' ') else {
        return Ok(None);
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Ok(None);
    }

    let token = rest.trim();
    if token.is_empty() {
        return Ok(None);
    }

    Ok(Some(token.to_string()))
}

/// Shared authorization logic for admin endpoints.
///
/// Requires the `ADMIN_TOKEN` secret as a bearer token; an unset secret
/// disables the admin surface entirely (fail-closed).
///
/// Returns `Ok(None)` when authorized; otherwise returns an error response.
pub async fn ensure_admin_authorized(req: &Request, env: &Env) -> Result<Option<worker::Response>> {
    let Some(token) = extract_bearer_token(req)? else {
        return Ok(Some(error_response(
            req,
            401,
            "missing_token",
            "Missing Authorization Bearer token",
        )?));
    };

    let Some(required) = env_string(env, "ADMIN_TOKEN") else {
        return Ok(Some(error_response(
            req,
            403,
            "admin_disabled",
            "Admin endpoints are not configured on this deployment",
        )?));
    };

    if token != required {
        return Ok(Some(error_response(
            req,
            401,
            "unauthorized",
            "Invalid admin token",
        )?));
    }

    Ok(None)
}
