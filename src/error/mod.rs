//! Error handling for jt.
//!
//! This module provides:
//! - [`JtError`]: The main error enum for all jt operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for jt operations.
#[derive(Error, Debug)]
pub enum JtError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Authentication rejected by {backend}: {reason}")]
    Auth { backend: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Storage backend '{backend}' unavailable: {reason}")]
    StorageUnavailable { backend: String, reason: String },

    #[error("Failed to write to '{backend}': {reason}")]
    StorageWrite { backend: String, reason: String },

    #[error("Invalid import file: {0}")]
    InvalidImport(String),

    #[error("Attachment '{attachment_id}' failed chunk integrity check: {reason}")]
    ChunkIntegrity {
        attachment_id: String,
        reason: String,
    },

    #[error("Record not found: {0}")]
    RecordNotFound(i64),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Operation requires approval: {0}")]
    ApprovalRequired(String),
}

impl JtError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Http(_) => ErrorCode::NetworkRequestFailed,
            Self::Auth { .. } => ErrorCode::NetworkAuthFailed,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::StorageUnavailable { .. } => ErrorCode::StorageUnavailable,
            Self::StorageWrite { .. } => ErrorCode::StorageWriteError,
            Self::InvalidImport(_) => ErrorCode::ImportInvalid,
            Self::ChunkIntegrity { .. } => ErrorCode::ChunkIntegrity,
            Self::RecordNotFound(_) => ErrorCode::RecordNotFound,
            Self::InvalidRecord(_) => ErrorCode::RecordInvalid,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::ApprovalRequired(_) => ErrorCode::ApprovalRequired,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::RecordNotFound(id) => Some(serde_json::json!({ "record_id": id })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            Self::StorageUnavailable { backend, reason }
            | Self::StorageWrite { backend, reason }
            | Self::Auth { backend, reason } => {
                Some(serde_json::json!({ "backend": backend, "reason": reason }))
            }
            Self::ChunkIntegrity {
                attachment_id,
                reason,
            } => Some(serde_json::json!({ "attachment_id": attachment_id, "reason": reason })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_jt_error(self)
    }

    /// Wrap a failure from a write path so the backend name travels with it.
    #[must_use]
    pub fn into_write_failure(self, backend: &str) -> Self {
        match self {
            Self::StorageWrite { .. } | Self::Auth { .. } => self,
            other => Self::StorageWrite {
                backend: backend.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for JtError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Emitted in robot mode so scripts can branch on `code` without parsing
/// the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "RECORD_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "record", "storage", "network")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`JtError`].
    #[must_use]
    pub fn from_jt_error(err: &JtError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self.suggestion = suggest_for_error(self.code, self.context.as_ref());
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&JtError> for StructuredError {
    fn from(err: &JtError) -> Self {
        Self::from_jt_error(err)
    }
}

/// Result type alias using JtError.
pub type Result<T> = std::result::Result<T, JtError>;
