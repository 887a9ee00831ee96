//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints
//! that mention the record id, backend, or config key involved.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
///
/// Falls back to [`ErrorCode::suggestion`] when the context does not carry
/// anything more specific.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::RecordNotFound => suggest_record_not_found(context),
        ErrorCode::ConfigMissingRequired => suggest_config_missing_required(context),
        ErrorCode::StorageUnavailable
        | ErrorCode::StorageWriteError
        | ErrorCode::NetworkAuthFailed => suggest_backend(code, context),
        _ => code.suggestion().to_string(),
    }
}

fn suggest_record_not_found(context: Option<&Value>) -> String {
    match context.and_then(|c| c.get("record_id")).and_then(Value::as_i64) {
        Some(id) => format!(
            "No record with id {id}. Run `jt list` to see identifiers, or `jt sync` if it was added on another device"
        ),
        None => ErrorCode::RecordNotFound.suggestion().to_string(),
    }
}

fn suggest_config_missing_required(context: Option<&Value>) -> String {
    match context.and_then(|c| c.get("config_key")).and_then(Value::as_str) {
        Some(key) => format!(
            "Set '{key}' in config.toml, or run `jt config show` to see where config is read from"
        ),
        None => ErrorCode::ConfigMissingRequired.suggestion().to_string(),
    }
}

fn suggest_backend(code: ErrorCode, context: Option<&Value>) -> String {
    let Some(backend) = context.and_then(|c| c.get("backend")).and_then(Value::as_str) else {
        return code.suggestion().to_string();
    };

    match code {
        ErrorCode::NetworkAuthFailed => format!(
            "The {backend} backend rejected the token. Check the variable named by [{backend}].token_env"
        ),
        ErrorCode::StorageUnavailable => format!(
            "The {backend} backend could not be opened. Check the [{backend}] section of your config; jt continues with empty data"
        ),
        _ => format!(
            "Saving to {backend} failed. Your changes are still in memory; run `jt sync` to retry"
        ),
    }
}
