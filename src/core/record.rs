//! Application record data structure

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{JtError, Result};

/// Shown when a record carries no company name at all.
pub const UNKNOWN_COMPANY: &str = "Unknown company";

/// A tracked job application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Millisecond timestamp taken at creation
    pub id: i64,
    /// Company applied to
    #[serde(default, alias = "company")]
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    /// Date the application was sent
    pub date_applied: NaiveDate,
    #[serde(default)]
    pub status: Status,
    /// Free text; older backups call this `requirements`
    #[serde(default, alias = "requirements")]
    pub notes: String,
    /// Attachments in upload order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Attachment>,
}

impl Record {
    /// Create a record with the required fields; everything else empty.
    pub fn new(id: i64, company_name: impl Into<String>, date_applied: NaiveDate) -> Self {
        Self {
            id,
            company_name: company_name.into(),
            position: None,
            location: None,
            salary: None,
            job_type: None,
            date_applied,
            status: Status::Applied,
            notes: String::new(),
            files: Vec::new(),
        }
    }

    /// Company name for display, falling back to [`UNKNOWN_COMPANY`].
    #[must_use]
    pub fn company_display(&self) -> &str {
        let name = self.company_name.trim();
        if name.is_empty() { UNKNOWN_COMPANY } else { name }
    }

    /// Reject records a user could not have entered through the form.
    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(JtError::InvalidRecord(format!(
                "record {} has no company name",
                self.id
            )));
        }
        if self.id <= 0 {
            return Err(JtError::InvalidRecord(format!(
                "record id must be positive, got {}",
                self.id
            )));
        }
        Ok(())
    }

    /// Apply the fields present in `patch`, keeping the identifier.
    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(value) = patch.company_name {
            self.company_name = value;
        }
        if let Some(value) = patch.position {
            self.position = non_empty(value);
        }
        if let Some(value) = patch.location {
            self.location = non_empty(value);
        }
        if let Some(value) = patch.salary {
            self.salary = non_empty(value);
        }
        if let Some(value) = patch.job_type {
            self.job_type = non_empty(value);
        }
        if let Some(value) = patch.date_applied {
            self.date_applied = value;
        }
        if let Some(value) = patch.status {
            self.status = value;
        }
        if let Some(value) = patch.notes {
            self.notes = value;
        }
        self.files.extend(patch.add_files);
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

/// Partial update for [`Record::apply`]. An empty string clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub date_applied: Option<NaiveDate>,
    pub status: Option<Status>,
    pub notes: Option<String>,
    pub add_files: Vec<Attachment>,
}

impl RecordPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.position.is_none()
            && self.location.is_none()
            && self.salary.is_none()
            && self.job_type.is_none()
            && self.date_applied.is_none()
            && self.status.is_none()
            && self.notes.is_none()
            && self.add_files.is_empty()
    }
}

/// Application status.
///
/// Values outside the known five are kept verbatim in [`Status::Other`]
/// so that data written by other clients survives a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Applied,
    InProgress,
    Selected,
    Rejected,
    RejectedInRounds,
    Other(String),
}

impl Status {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Applied => "applied",
            Self::InProgress => "in-progress",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
            Self::RejectedInRounds => "rejected-in-rounds",
            Self::Other(raw) => raw,
        }
    }

    /// Human label; unknown values are shown as stored.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Applied => "Applied",
            Self::InProgress => "In Progress",
            Self::Selected => "Selected",
            Self::Rejected => "Rejected",
            Self::RejectedInRounds => "Rejected in Rounds",
            Self::Other(raw) => raw,
        }
    }

    /// Rejected at any stage.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected | Self::RejectedInRounds)
    }

    /// The company answered, either way.
    #[must_use]
    pub const fn is_response(&self) -> bool {
        matches!(self, Self::Selected) || self.is_rejection()
    }

    /// The five statuses the form offers.
    #[must_use]
    pub const fn known() -> [Self; 5] {
        [
            Self::Applied,
            Self::InProgress,
            Self::Selected,
            Self::Rejected,
            Self::RejectedInRounds,
        ]
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        match value {
            "applied" => Self::Applied,
            "in-progress" => Self::InProgress,
            "selected" => Self::Selected,
            "rejected" => Self::Rejected,
            "rejected-in-rounds" => Self::RejectedInRounds,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match Self::from(value.as_str()) {
            Self::Other(_) => Self::Other(value),
            known => known,
        }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        match value {
            Status::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file attached to a record. The payload travels as base64 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Generated when a backup omits it
    #[serde(default = "new_attachment_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// Decoded size in bytes
    #[serde(default)]
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub data: String,
}

impl Attachment {
    /// Build an attachment from raw bytes with a fresh identifier.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_attachment_id(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            uploaded_at,
            data: BASE64.encode(bytes),
        }
    }

    /// Read a file from disk, guessing the MIME type from its extension.
    pub fn from_path(path: &std::path::Path, uploaded_at: DateTime<Utc>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());
        let mime = guess_mime(path);
        Ok(Self::from_bytes(name, mime, &bytes, uploaded_at))
    }

    /// Decode the payload back into bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64.decode(self.data.as_bytes()).map_err(|err| {
            JtError::InvalidRecord(format!("attachment {} payload is not base64: {err}", self.id))
        })
    }
}

fn new_attachment_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn guess_mime(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt" | "md") => "text/plain",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
