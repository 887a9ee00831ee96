//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Record errors
//! - 3xx: Config errors
//! - 5xx: Network errors
//! - 6xx: Storage errors
//! - 7xx: Import / sync errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `RecordNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Record errors (1xx)
    // ========================================
    /// E101: No record with the requested identifier
    RecordNotFound,
    /// E102: Record fields are invalid
    RecordInvalid,
    /// E103: Two records share an identifier
    DuplicateIdentifier,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Network errors (5xx)
    // ========================================
    /// E501: Remote request failed
    NetworkRequestFailed,
    /// E503: Remote rejected our credentials
    NetworkAuthFailed,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Backend is not initialized or cannot be reached
    StorageUnavailable,
    /// E602: Failed to write to a backend
    StorageWriteError,
    /// E604: Database operation failed
    DatabaseError,
    /// E605: Serialization/deserialization failed
    SerializationError,
    /// E606: Attachment chunks are missing or corrupted
    ChunkIntegrity,

    // ========================================
    // Import / sync errors (7xx)
    // ========================================
    /// E701: Backup file is malformed
    ImportInvalid,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Validation rules failed
    ValidationFailed,
    /// E802: Operation requires explicit approval
    ApprovalRequired,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E905: Generic not found (catch-all)
    NotFound,
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `RecordNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::RecordNotFound => 101,
            Self::RecordInvalid => 102,
            Self::DuplicateIdentifier => 103,
            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,
            Self::NetworkRequestFailed => 501,
            Self::NetworkAuthFailed => 503,
            Self::StorageUnavailable => 601,
            Self::StorageWriteError => 602,
            Self::DatabaseError => 604,
            Self::SerializationError => 605,
            Self::ChunkIntegrity => 606,
            Self::ImportInvalid => 701,
            Self::ValidationFailed => 801,
            Self::ApprovalRequired => 802,
            Self::NotFound => 905,
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Run `jt list` to see record identifiers",
            Self::RecordInvalid => "Check the record fields; dates use YYYY-MM-DD",
            Self::DuplicateIdentifier => "Each record needs a unique id. Remove duplicates from the backup file",
            Self::ConfigInvalid => "Run `jt config show` to see current values. Check TOML syntax in config file",
            Self::ConfigMissingRequired => "Set the missing value in config.toml or through its JT_* environment variable",
            Self::NetworkRequestFailed => "Check your network connection. Data is kept locally until the next successful save",
            Self::NetworkAuthFailed => "Verify the access token in the environment variable named by your config",
            Self::StorageUnavailable => "The backend could not be opened. Check its configuration; continuing with empty data",
            Self::StorageWriteError => "Check disk space, quota, and write permissions. In-memory data was not rolled back",
            Self::DatabaseError => "The embedded database failed. Check the jt.db file under the data root",
            Self::SerializationError => "The stored data may be corrupted. Check input data for validity",
            Self::ChunkIntegrity => "Attachment chunks are missing or corrupted. Re-upload the attachment",
            Self::ImportInvalid => "A backup must be a JSON array of records, as written by `jt export`",
            Self::ValidationFailed => "Review the validation errors and fix each issue",
            Self::ApprovalRequired => "This operation is destructive. Re-run with --approve",
            Self::NotFound => "The requested resource was not found. Check the path or identifier",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::DatabaseError | Self::SerializationError | Self::ChunkIntegrity
        )
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "record",
            3 => "config",
            5 => "network",
            6 => "storage",
            7 => "import",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over every error code.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::RecordNotFound,
            Self::RecordInvalid,
            Self::DuplicateIdentifier,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::NetworkRequestFailed,
            Self::NetworkAuthFailed,
            Self::StorageUnavailable,
            Self::StorageWriteError,
            Self::DatabaseError,
            Self::SerializationError,
            Self::ChunkIntegrity,
            Self::ImportInvalid,
            Self::ValidationFailed,
            Self::ApprovalRequired,
            Self::NotFound,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
