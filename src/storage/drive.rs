//! Google Drive backend: one JSON file inside a dedicated folder.

use chrono::Utc;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{Backend, BackendKind, StorageUsage, http};
use crate::config::Config;
use crate::core::Record;
use crate::error::{JtError, Result};

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const ENVELOPE_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveEnvelope {
    #[serde(default)]
    pub applications: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

/// Account storage quota in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveQuota {
    pub limit: Option<u64>,
    pub usage: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct About {
    storage_quota: RawQuota,
}

/// Drive reports quota numbers as strings.
#[derive(Debug, Deserialize)]
struct RawQuota {
    #[serde(default)]
    limit: Option<String>,
    #[serde(default)]
    usage: Option<String>,
}

pub struct DriveBackend {
    api_url: String,
    token: String,
    folder_name: String,
    file_name: String,
    folder_id: Option<String>,
    file_id: Option<String>,
    http: Client,
}

impl DriveBackend {
    pub fn new(
        api_url: &str,
        token: &str,
        folder_name: &str,
        file_name: &str,
        timeout_seconds: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            folder_name: folder_name.to_string(),
            file_name: file_name.to_string(),
            folder_id: None,
            file_id: None,
            http: http::client(timeout_seconds)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let drive = &config.drive;
        let token = http::token_from_env("drive", &drive.token_env)?;
        Self::new(
            &drive.api_url,
            &token,
            &drive.folder_name,
            &drive.file_name,
            config.network.timeout_seconds,
        )
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}{path}", self.api_url), params)
            .map_err(|err| JtError::Config(format!("invalid drive api_url: {err}")))
    }

    fn find_one(&self, query: &str) -> Result<Option<String>> {
        let url = self.url(
            "/drive/v3/files",
            &[("q", query), ("fields", "files(id, name)"), ("spaces", "drive")],
        )?;
        let response = self.http.get(url).bearer_auth(&self.token).send()?;
        let list: FileList = http::check(response, "drive")?.json()?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    fn create(&self, metadata: &serde_json::Value) -> Result<String> {
        let url = self.url("/drive/v3/files", &[("fields", "id")])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(metadata)
            .send()?;
        let created: FileRef = http::check(response, "drive")?.json()?;
        Ok(created.id)
    }

    /// Folder id, found by name or created.
    fn ensure_folder(&mut self) -> Result<String> {
        if let Some(id) = &self.folder_id {
            return Ok(id.clone());
        }
        let id = match self.find_one(&folder_query(&self.folder_name))? {
            Some(id) => {
                debug!(folder_id = %id, "found drive folder");
                id
            }
            None => {
                let id = self.create(&json!({
                    "name": self.folder_name,
                    "mimeType": FOLDER_MIME,
                }))?;
                info!(folder_id = %id, folder = %self.folder_name, "created drive folder");
                id
            }
        };
        self.folder_id = Some(id.clone());
        Ok(id)
    }

    fn find_data_file(&mut self) -> Result<Option<String>> {
        if self.file_id.is_some() {
            return Ok(self.file_id.clone());
        }
        let folder_id = self.ensure_folder()?;
        self.file_id = self.find_one(&file_query(&self.file_name, &folder_id))?;
        Ok(self.file_id.clone())
    }

    fn upload(&self, file_id: &str, body: String) -> Result<()> {
        let url = self.url(
            &format!("/upload/drive/v3/files/{file_id}"),
            &[("uploadType", "media")],
        )?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .body(body)
            .send()?;
        http::check(response, "drive")?;
        Ok(())
    }

    fn write(&mut self, records: &[Record]) -> Result<()> {
        let envelope = DriveEnvelope {
            applications: records.to_vec(),
            last_updated: Some(Utc::now().to_rfc3339()),
            version: Some(ENVELOPE_VERSION.to_string()),
        };
        let body = serde_json::to_string_pretty(&envelope)?;

        let file_id = match self.find_data_file()? {
            Some(id) => id,
            None => {
                let folder_id = self.ensure_folder()?;
                let id = self.create(&json!({
                    "name": self.file_name,
                    "mimeType": "application/json",
                    "parents": [folder_id],
                }))?;
                self.file_id = Some(id.clone());
                id
            }
        };

        debug!(bytes = body.len(), file_id = %file_id, "uploading to drive");
        self.upload(&file_id, body)
    }

    /// Account-wide quota.
    pub fn storage_quota(&self) -> Result<DriveQuota> {
        let url = self.url("/drive/v3/about", &[("fields", "storageQuota")])?;
        let response = self.http.get(url).bearer_auth(&self.token).send()?;
        let about: About = http::check(response, "drive")?.json()?;
        let parse = |raw: Option<String>| raw.and_then(|v| v.parse::<u64>().ok());
        Ok(DriveQuota {
            limit: parse(about.storage_quota.limit),
            usage: parse(about.storage_quota.usage).unwrap_or(0),
        })
    }
}

/// Query for the data folder by name.
#[must_use]
pub fn folder_query(folder_name: &str) -> String {
    format!(
        "name='{}' and mimeType='{FOLDER_MIME}' and trashed=false",
        escape(folder_name)
    )
}

/// Query for the data file inside `folder_id`.
#[must_use]
pub fn file_query(file_name: &str, folder_id: &str) -> String {
    format!(
        "name='{}' and '{}' in parents and trashed=false",
        escape(file_name),
        escape(folder_id)
    )
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

impl Backend for DriveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Drive
    }

    fn load_all(&mut self) -> Result<Vec<Record>> {
        let Some(file_id) = self.find_data_file()? else {
            debug!("no data file in drive");
            return Ok(Vec::new());
        };
        let url = self.url(&format!("/drive/v3/files/{file_id}"), &[("alt", "media")])?;
        let response = self.http.get(url).bearer_auth(&self.token).send()?;
        let text = http::check(response, "drive")?.text()?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let envelope: DriveEnvelope = serde_json::from_str(&text)?;
        debug!(count = envelope.applications.len(), "loaded drive file");
        Ok(envelope.applications)
    }

    fn save_all(&mut self, records: &[Record]) -> Result<()> {
        self.write(records)
            .map_err(|err| err.into_write_failure("drive"))?;
        info!(count = records.len(), "synced to drive");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.save_all(&[])
    }

    fn usage(&mut self) -> Result<Option<StorageUsage>> {
        let quota = self.storage_quota()?;
        Ok(Some(StorageUsage {
            bytes_used: Some(quota.usage),
            bytes_limit: quota.limit,
            ..StorageUsage::default()
        }))
    }
}
