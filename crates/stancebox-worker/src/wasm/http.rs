use std::fmt::Display;

use worker::{Headers, Request, Response, Result};

use crate::error::VoteError;

fn cors_headers(req: &Request) -> Result<Headers> {
    let headers = Headers::new();

    // Reflect Origin when present; otherwise allow all. The voting form is
    // served from a separate static site.
    let origin = req.headers().get("Origin")?.unwrap_or_else(|| "*".to_string());

    headers.set("Access-Control-Allow-Origin", &origin)?;
    headers.set("Vary", "Origin")?;
    headers.set("Access-Control-Allow-Methods", "GET,POST,OPTIONS")?;
    headers.set(
        "Access-Control-Allow-Headers",
        "Authorization,Content-Type,Accept,X-Requested-With",
    )?;

    Ok(headers)
}

pub fn json_with_cors(req: &Request, mut resp: Response) -> Result<Response> {
    let headers = cors_headers(req)?;
    let resp_headers = resp.headers_mut();
    for (k, v) in headers.entries() {
        resp_headers.set(&k, &v)?;
    }

    Ok(resp)
}

pub fn error_response(req: &Request, status: u16, code: &str, message: &str) -> Result<Response> {
    let body = serde_json::json!({
        "success": false,
        "error": {
            "code": code,
            "message": message
        }
    });

    let resp = Response::from_json(&body)?.with_status(status);
    json_with_cors(req, resp)
}

pub fn internal_error_response<E: Display>(req: &Request, context: &str, err: &E) -> Result<Response> {
    worker::console_log!("{context}: {err}");
    error_response(req, 500, "internal_error", "Internal server error")
}

/// Translate a protocol error into its stable wire shape.
///
/// Internal/database failures are logged and collapsed into a generic 500 so
/// driver detail, fingerprints, and secrets never leak. Terminal states keep
/// distinct codes so the UI can branch instead of suggesting a retry.
pub fn vote_error_response(req: &Request, context: &str, err: &VoteError) -> Result<Response> {
    if err.is_internal() {
        return internal_error_response(req, context, err);
    }

    let mut body = serde_json::json!({
        "success": false,
        "error": {
            "code": err.code(),
            "message": err.to_string()
        }
    });
    if let VoteError::RateLimited { retry_after } = err {
        body["error"]["retryAfter"] = (*retry_after).into();
    }
    if let VoteError::WrongCode { attempts_left } = err {
        body["error"]["attemptsLeft"] = (*attempts_left).into();
    }

    let resp = Response::from_json(&body)?.with_status(err.http_status());
    json_with_cors(req, resp)
}

pub fn not_found(req: &Request) -> Result<Response> {
    error_response(req, 404, "not_found", "Not found")
}
