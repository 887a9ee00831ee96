//! Cloud document store backend.
//!
//! One document per record in `applications`, oversized attachment
//! payloads moved to `attachment_chunks`, and a `meta/summary` document
//! with the record count. Every document holds a single string field
//! `json` carrying the serialized value.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::chunk::{self, Chunk};
use super::{Backend, BackendKind, StorageUsage, http};
use crate::config::{Config, DOCUMENT_SIZE_CEILING};
use crate::core::Record;
use crate::error::{JtError, Result};

pub const APPLICATIONS: &str = "applications";
pub const CHUNKS: &str = "attachment_chunks";
pub const META: &str = "meta";
pub const SUMMARY_DOC: &str = "summary";

const PAGE_SIZE: &str = "300";

/// Room left in a record document for the wrapper fields around the record.
const RECORD_DOC_OVERHEAD: usize = 4096;

/// Minimal document-store surface the backend needs.
pub trait DocumentStore {
    /// `(document id, json)` for every document in `collection`.
    fn list(&mut self, collection: &str) -> Result<Vec<(String, String)>>;

    fn get(&mut self, collection: &str, id: &str) -> Result<Option<String>>;

    /// Create or replace.
    fn put(&mut self, collection: &str, id: &str, json: &str) -> Result<()>;

    /// Deleting a missing document is not an error.
    fn delete(&mut self, collection: &str, id: &str) -> Result<()>;
}

/// A record as stored, with the positions of attachments moved to chunk docs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub order: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunked: Vec<usize>,
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub last_updated: String,
}

pub struct FirestoreBackend {
    store: Box<dyn DocumentStore>,
    chunk_size: usize,
}

impl FirestoreBackend {
    pub fn new(store: Box<dyn DocumentStore>, chunk_size: usize) -> Self {
        Self { store, chunk_size }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = FirestoreClient::from_config(config)?;
        Ok(Self::new(Box::new(client), config.chunking.chunk_size))
    }

    /// Summary document written by the last save, if any.
    pub fn summary(&mut self) -> Result<Option<Summary>> {
        self.store
            .get(META, SUMMARY_DOC)?
            .map(|raw| serde_json::from_str(&raw).map_err(JtError::from))
            .transpose()
    }

    fn write_summary(&mut self, count: usize) -> Result<()> {
        let summary = Summary {
            count,
            last_updated: Utc::now().to_rfc3339(),
        };
        self.store
            .put(META, SUMMARY_DOC, &serde_json::to_string(&summary)?)
    }

    fn write(&mut self, records: &[Record]) -> Result<()> {
        // Build every document first so an oversized record aborts the
        // save before anything is written.
        let mut record_docs = Vec::with_capacity(records.len());
        let mut chunk_docs = Vec::new();
        for (order, record) in records.iter().enumerate() {
            let (stored, moved) = chunk::externalize(
                record,
                self.chunk_size,
                DOCUMENT_SIZE_CEILING - RECORD_DOC_OVERHEAD,
            )?;
            let doc = StoredRecord {
                order,
                chunked: moved.iter().map(|m| m.position).collect(),
                record: stored,
            };
            let raw = serde_json::to_string(&doc)?;
            if raw.len() >= DOCUMENT_SIZE_CEILING {
                return Err(JtError::StorageWrite {
                    backend: "firestore".to_string(),
                    reason: format!(
                        "record {} is {} bytes after chunking, over the {DOCUMENT_SIZE_CEILING} byte document limit",
                        record.id,
                        raw.len()
                    ),
                });
            }
            record_docs.push((record.id.to_string(), raw));
            for chunk in moved.into_iter().flat_map(|m| m.chunks) {
                chunk_docs.push((chunk.doc_id(), serde_json::to_string(&chunk)?));
            }
        }

        let existing_records: BTreeSet<String> =
            self.store.list(APPLICATIONS)?.into_iter().map(|(id, _)| id).collect();
        let existing_chunks: BTreeSet<String> =
            self.store.list(CHUNKS)?.into_iter().map(|(id, _)| id).collect();

        // Chunks before records, so no stored record points at missing chunks.
        for (id, raw) in &chunk_docs {
            self.store.put(CHUNKS, id, raw)?;
        }
        for (id, raw) in &record_docs {
            self.store.put(APPLICATIONS, id, raw)?;
        }

        let keep_records: BTreeSet<&String> = record_docs.iter().map(|(id, _)| id).collect();
        for stale in existing_records.iter().filter(|id| !keep_records.contains(id)) {
            self.store.delete(APPLICATIONS, stale)?;
        }
        let keep_chunks: BTreeSet<&String> = chunk_docs.iter().map(|(id, _)| id).collect();
        for stale in existing_chunks.iter().filter(|id| !keep_chunks.contains(id)) {
            self.store.delete(CHUNKS, stale)?;
        }

        self.write_summary(records.len())?;
        info!(
            records = record_docs.len(),
            chunks = chunk_docs.len(),
            "saved to firestore"
        );
        Ok(())
    }
}

impl Backend for FirestoreBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Firestore
    }

    fn load_all(&mut self) -> Result<Vec<Record>> {
        let mut docs = self
            .store
            .list(APPLICATIONS)?
            .into_iter()
            .map(|(_, raw)| serde_json::from_str::<StoredRecord>(&raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        docs.sort_by_key(|doc| (doc.order, doc.record.id));

        let mut grouped = if docs.iter().any(|doc| !doc.chunked.is_empty()) {
            let chunks = self
                .store
                .list(CHUNKS)?
                .into_iter()
                .map(|(_, raw)| serde_json::from_str::<Chunk>(&raw))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            chunk::group_by_parent(chunks)
        } else {
            BTreeMap::new()
        };

        let mut records = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut record = doc.record;
            chunk::internalize(&mut record, &doc.chunked, &mut grouped)?;
            records.push(record);
        }
        if !grouped.is_empty() {
            warn!(orphans = grouped.len(), "attachment chunks without a parent record");
        }
        debug!(count = records.len(), "loaded firestore records");
        Ok(records)
    }

    fn save_all(&mut self, records: &[Record]) -> Result<()> {
        self.write(records)
            .map_err(|err| err.into_write_failure("firestore"))
    }

    fn clear(&mut self) -> Result<()> {
        for collection in [APPLICATIONS, CHUNKS] {
            for (id, _) in self.store.list(collection)? {
                self.store.delete(collection, &id)?;
            }
        }
        self.write_summary(0)
    }

    fn usage(&mut self) -> Result<Option<StorageUsage>> {
        Ok(self.summary()?.map(|summary| StorageUsage {
            records: Some(summary.count),
            last_updated: Some(summary.last_updated),
            ..StorageUsage::default()
        }))
    }
}

/// Firestore REST client.
pub struct FirestoreClient {
    documents_url: String,
    token: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RestDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, RestValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestValue {
    #[serde(default)]
    string_value: Option<String>,
}

impl RestDocument {
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn into_json(self) -> Option<String> {
        self.fields.into_iter().find(|(k, _)| k == "json").and_then(|(_, v)| v.string_value)
    }
}

impl FirestoreClient {
    pub fn new(
        base_url: &str,
        project_id: &str,
        database: &str,
        token: &str,
        timeout_seconds: u64,
    ) -> Result<Self> {
        Ok(Self {
            documents_url: format!(
                "{}/projects/{project_id}/databases/{database}/documents",
                base_url.trim_end_matches('/')
            ),
            token: token.to_string(),
            http: http::client(timeout_seconds)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let firestore = &config.firestore;
        let project_id = firestore
            .project_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| JtError::MissingConfig("firestore.project_id".to_string()))?;
        let token = http::token_from_env("firestore", &firestore.token_env)?;
        Self::new(
            &firestore.base_url,
            project_id,
            &firestore.database,
            &token,
            config.network.timeout_seconds,
        )
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_url)
    }
}

impl DocumentStore for FirestoreClient {
    fn list(&mut self, collection: &str) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let base = format!("{}/{collection}", self.documents_url);
            let mut params = vec![("pageSize", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = Url::parse_with_params(&base, &params)
                .map_err(|err| JtError::Config(format!("invalid firestore base_url: {err}")))?;
            let response = self.http.get(url).bearer_auth(&self.token).send()?;
            let page: ListResponse = http::check(response, "firestore")?.json()?;

            for doc in page.documents {
                let id = doc.id().to_string();
                if let Some(raw) = doc.into_json() {
                    out.push((id, raw));
                }
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(out)
    }

    fn get(&mut self, collection: &str, id: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.doc_url(collection, id))
            .bearer_auth(&self.token)
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let doc: RestDocument = http::check(response, "firestore")?.json()?;
        Ok(doc.into_json())
    }

    fn put(&mut self, collection: &str, id: &str, raw: &str) -> Result<()> {
        let body = json!({ "fields": { "json": { "stringValue": raw } } });
        let response = self
            .http
            .patch(self.doc_url(collection, id))
            .bearer_auth(&self.token)
            .json(&body)
            .send()?;
        http::check(response, "firestore")?;
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.doc_url(collection, id))
            .bearer_auth(&self.token)
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        http::check(response, "firestore")?;
        Ok(())
    }
}

/// Document store kept in process memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    docs: BTreeMap<(String, String), String>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.docs.keys().filter(|(c, _)| c == collection).count()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list(&mut self, collection: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .docs
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, id), raw)| (id.clone(), raw.clone()))
            .collect())
    }

    fn get(&mut self, collection: &str, id: &str) -> Result<Option<String>> {
        Ok(self
            .docs
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    fn put(&mut self, collection: &str, id: &str, raw: &str) -> Result<()> {
        self.docs
            .insert((collection.to_string(), id.to_string()), raw.to_string());
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<()> {
        self.docs.remove(&(collection.to_string(), id.to_string()));
        Ok(())
    }
}

/// Shares one [`MemoryDocumentStore`] between a backend and a test.
impl DocumentStore for std::rc::Rc<std::cell::RefCell<MemoryDocumentStore>> {
    fn list(&mut self, collection: &str) -> Result<Vec<(String, String)>> {
        self.borrow_mut().list(collection)
    }

    fn get(&mut self, collection: &str, id: &str) -> Result<Option<String>> {
        self.borrow_mut().get(collection, id)
    }

    fn put(&mut self, collection: &str, id: &str, raw: &str) -> Result<()> {
        self.borrow_mut().put(collection, id, raw)
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<()> {
        self.borrow_mut().delete(collection, id)
    }
}
