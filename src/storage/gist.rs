//! GitHub Gist backend: the whole collection lives in one JSON file.

use std::collections::BTreeMap;

use chrono::Utc;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{Backend, BackendKind, http};
use crate::config::Config;
use crate::core::Record;
use crate::error::{JtError, Result};

/// Body of the data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GistEnvelope {
    #[serde(default)]
    pub applications: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: BTreeMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

pub struct GistBackend {
    api_url: String,
    gist_id: String,
    file_name: String,
    token: String,
    http: Client,
}

impl GistBackend {
    pub fn new(
        api_url: &str,
        gist_id: &str,
        file_name: &str,
        token: &str,
        timeout_seconds: u64,
    ) -> Result<Self> {
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            gist_id: gist_id.to_string(),
            file_name: file_name.to_string(),
            token: token.to_string(),
            http: http::client(timeout_seconds)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let gist = &config.gist;
        let gist_id = gist
            .gist_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| JtError::MissingConfig("gist.gist_id".to_string()))?;
        let token = http::token_from_env("gist", &gist.token_env)?;
        Self::new(
            &gist.api_url,
            gist_id,
            &gist.file_name,
            &token,
            config.network.timeout_seconds,
        )
    }

    fn url(&self) -> String {
        format!("{}/gists/{}", self.api_url, self.gist_id)
    }

    fn fetch_content(&self) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.url())
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(JtError::StorageUnavailable {
                backend: "gist".to_string(),
                reason: format!("gist {} not found; check gist.gist_id", self.gist_id),
            });
        }
        let gist: GistResponse = http::check(response, "gist")?.json()?;

        let Some(file) = gist.files.get(&self.file_name) else {
            return Ok(None);
        };
        // Large files come back truncated; the raw URL has the full text.
        if file.truncated {
            if let Some(raw_url) = &file.raw_url {
                let response = self.http.get(raw_url).bearer_auth(&self.token).send()?;
                return Ok(Some(http::check(response, "gist")?.text()?));
            }
        }
        Ok(file.content.clone())
    }

    fn write_content(&self, content: String) -> Result<()> {
        let body = json!({
            "files": {
                (self.file_name.as_str()): { "content": content }
            }
        });
        let response = self
            .http
            .patch(self.url())
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()?;
        http::check(response, "gist")?;
        Ok(())
    }
}

/// Accepts the envelope or a bare array (a freshly created gist holds `[]`).
pub fn parse_content(content: &str) -> Result<Vec<Record>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(content)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => Ok(serde_json::from_value::<GistEnvelope>(other)?.applications),
    }
}

impl Backend for GistBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gist
    }

    fn load_all(&mut self) -> Result<Vec<Record>> {
        let records = match self.fetch_content()? {
            Some(content) => parse_content(&content)?,
            None => Vec::new(),
        };
        debug!(count = records.len(), gist_id = %self.gist_id, "loaded gist");
        Ok(records)
    }

    fn save_all(&mut self, records: &[Record]) -> Result<()> {
        let envelope = GistEnvelope {
            applications: records.to_vec(),
            last_updated: Some(Utc::now().to_rfc3339()),
        };
        let content = serde_json::to_string_pretty(&envelope)?;
        self.write_content(content)
            .map_err(|err| err.into_write_failure("gist"))?;
        info!(count = records.len(), gist_id = %self.gist_id, "synced to gist");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.save_all(&[])
    }
}
