//! Shared plumbing for the HTTP-backed stores.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};

use crate::error::{JtError, Result};

/// Blocking client with the configured timeout and a jt user agent.
pub fn client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("jt/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| JtError::Config(format!("HTTP client error: {e}")))
}

/// Read the access token from the environment variable named in config.
pub fn token_from_env(backend: &str, var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(JtError::MissingConfig(format!(
            "{backend} access token (set {var})"
        ))),
    }
}

/// Pass successful responses through; turn the rest into errors carrying
/// the status and a snippet of the body.
pub fn check(response: Response, backend: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(JtError::Auth {
            backend: backend.to_string(),
            reason: format!("{status}: {snippet}"),
        });
    }
    Err(JtError::Http(format!("{backend} returned {status}: {snippet}")))
}
