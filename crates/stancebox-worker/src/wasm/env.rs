use worker::Env;

use crate::config::Config;

pub fn normalize_env_value(raw: String) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return inner.trim().to_string();
    }

    trimmed.to_string()
}

pub fn env_string(env: &Env, key: &str) -> Option<String> {
    env.var(key)
        .ok()
        .map(|v| normalize_env_value(v.to_string()))
        .filter(|s| !s.is_empty())
}

fn require_env(env: &Env, key: &str) -> Result<String, worker::Error> {
    env_string(env, key).ok_or_else(|| worker::Error::RustError(format!("{key} is required")))
}

/// Assemble the protocol configuration from Worker vars/secrets.
///
/// The salt and signing key are secrets; they are read here once and never
/// logged.
pub fn load_config(env: &Env) -> Result<Config, worker::Error> {
    Ok(Config {
        fingerprint_salt: require_env(env, "FINGERPRINT_SALT")?,
        credential_secret: require_env(env, "CREDENTIAL_SECRET")?,
        ballot_base_url: require_env(env, "BALLOT_BASE_URL")?,
        admin_notify_email: env_string(env, "ADMIN_NOTIFY_EMAIL"),
    })
}
