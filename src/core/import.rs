//! Backup files: parsing, merge/replace import, export.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::collection::{Collection, first_duplicate_id};
use super::record::Record;
use crate::error::{JtError, Result};

/// How imported records combine with the current set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Keep existing records; append unseen identifiers.
    #[default]
    Merge,
    /// The backup becomes the collection.
    Replace,
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => f.write_str("merge"),
            Self::Replace => f.write_str("replace"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub mode: ImportMode,
    /// Records in the backup file
    pub imported: usize,
    pub added: usize,
    pub skipped: usize,
    /// Collection size afterwards
    pub total: usize,
}

/// Parse a backup file. Anything but a JSON array of valid records is
/// rejected as a whole.
pub fn parse_backup(raw: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| JtError::InvalidImport(format!("not valid JSON: {err}")))?;

    let Value::Array(items) = value else {
        return Err(JtError::InvalidImport(format!(
            "expected a JSON array of records, found {}",
            kind_of(&value)
        )));
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Record>(item)
                .map_err(|err| JtError::InvalidImport(format!("record at index {index}: {err}")))
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(id) = first_duplicate_id(&records) {
        return Err(JtError::InvalidImport(format!(
            "identifier {id} appears more than once"
        )));
    }

    Ok(records)
}

/// Apply parsed backup records to `collection`.
pub fn apply_import(collection: &mut Collection, records: Vec<Record>, mode: ImportMode) -> ImportOutcome {
    let imported = records.len();
    let (added, skipped) = match mode {
        ImportMode::Merge => {
            let outcome = collection.merge(records);
            (outcome.added, outcome.skipped)
        }
        ImportMode::Replace => {
            collection.replace(records);
            (imported, 0)
        }
    };
    ImportOutcome {
        mode,
        imported,
        added,
        skipped,
        total: collection.len(),
    }
}

/// Pretty-printed JSON array, the same shape `parse_backup` accepts.
pub fn export_backup(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Default backup file name for `date`.
#[must_use]
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("job-applications-backup-{}.json", date.format("%Y-%m-%d"))
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
