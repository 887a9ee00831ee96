//! Local key-value cache: one file per key under `<root>/local/`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Backend, BackendKind, StorageUsage};
use crate::core::Record;
use crate::error::{JtError, Result};

/// Holds the whole collection as a JSON array under one key.
#[derive(Debug)]
pub struct LocalCache {
    dir: PathBuf,
    key: String,
}

impl LocalCache {
    /// Open the cache directory, creating it if needed.
    pub fn open(root: &Path, key: &str) -> Result<Self> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(JtError::Config(format!("invalid local cache key '{key}'")));
        }
        let dir = root.join("local");
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            key: key.to_string(),
        })
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    /// Raw value stored under the key, if any.
    pub fn get_raw(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path()) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Write via a temp file in the same directory, then rename over the key.
    pub fn set_raw(&self, value: &str) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path()).map_err(|err| JtError::Io(err.error))?;
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Backend for LocalCache {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn load_all(&mut self) -> Result<Vec<Record>> {
        let Some(raw) = self.get_raw()? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<Record> = serde_json::from_str(&raw)?;
        debug!(count = records.len(), path = %self.path().display(), "loaded local cache");
        Ok(records)
    }

    fn save_all(&mut self, records: &[Record]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.set_raw(&raw)
            .map_err(|err| err.into_write_failure(self.name()))?;
        debug!(count = records.len(), bytes = raw.len(), "saved local cache");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.remove()
    }

    fn usage(&mut self) -> Result<Option<StorageUsage>> {
        let bytes = match std::fs::metadata(self.path()) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => 0,
            Err(err) => return Err(err.into()),
        };
        Ok(Some(StorageUsage {
            bytes_used: Some(bytes),
            ..StorageUsage::default()
        }))
    }
}
