use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JtError, Result};
use crate::storage::BackendKind;

/// Largest document a cloud document store accepts.
pub const DOCUMENT_SIZE_CEILING: usize = 1_048_576;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub firestore: FirestoreConfig,
    #[serde(default)]
    pub gist: GistConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub autosync: AutosyncConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Load layered config: defaults, then global and project files (or an
    /// explicit path), then `JT_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("JT_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(&|key: &str| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Path of the per-user config file, if a config directory exists.
    #[must_use]
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jt/config.toml"))
    }

    #[must_use]
    pub fn project_path(root: &Path) -> PathBuf {
        root.join("config.toml")
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match Self::global_path() {
            Some(path) => Self::load_patch(&path),
            None => Ok(None),
        }
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&Self::project_path(root))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| JtError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| JtError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    /// Write the full config as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|err| JtError::Config(format!("serialize config: {err}")))?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.local {
            self.local.merge(patch);
        }
        if let Some(patch) = patch.database {
            self.database.merge(patch);
        }
        if let Some(patch) = patch.firestore {
            self.firestore.merge(patch);
        }
        if let Some(patch) = patch.gist {
            self.gist.merge(patch);
        }
        if let Some(patch) = patch.drive {
            self.drive.merge(patch);
        }
        if let Some(patch) = patch.chunking {
            self.chunking.merge(patch);
        }
        if let Some(patch) = patch.autosync {
            self.autosync.merge(patch);
        }
        if let Some(patch) = patch.network {
            self.network.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self, env: &dyn Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = env("JT_STORAGE_PRIMARY") {
            self.storage.primary = value.parse()?;
        }
        if let Some(values) = env_list(env, "JT_STORAGE_FALLBACKS") {
            self.storage.fallbacks = values
                .iter()
                .map(|value| value.parse())
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(value) = env("JT_STORAGE_REMOTE") {
            self.storage.remote = parse_optional_backend(&value)?;
        }

        if let Some(value) = env("JT_DATABASE_FILE") {
            self.database.file = value;
        }

        if let Some(value) = env("JT_FIRESTORE_PROJECT_ID") {
            self.firestore.project_id = Some(value);
        }
        if let Some(value) = env("JT_FIRESTORE_BASE_URL") {
            self.firestore.base_url = value;
        }

        if let Some(value) = env("JT_GIST_ID") {
            self.gist.gist_id = Some(value);
        }
        if let Some(value) = env("JT_GIST_API_URL") {
            self.gist.api_url = value;
        }

        if let Some(value) = env("JT_DRIVE_API_URL") {
            self.drive.api_url = value;
        }
        if let Some(value) = env("JT_DRIVE_FOLDER_NAME") {
            self.drive.folder_name = value;
        }

        if let Some(value) = env_usize(env, "JT_CHUNK_SIZE")? {
            self.chunking.chunk_size = value;
        }

        if let Some(value) = env_u64(env, "JT_AUTOSYNC_INTERVAL_SECONDS")? {
            self.autosync.interval_seconds = value;
        }
        if let Some(value) = env_bool(env, "JT_AUTOSYNC_SKIP_UNCHANGED") {
            self.autosync.skip_unchanged = value;
        }

        if let Some(value) = env_u64(env, "JT_HTTP_TIMEOUT_SECONDS")? {
            self.network.timeout_seconds = value;
        }

        Ok(())
    }

    /// Reject combinations no backend can honor.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(JtError::Config("chunking.chunk_size must be positive".to_string()));
        }
        // Leave room for the chunk document's own fields.
        if self.chunking.chunk_size >= DOCUMENT_SIZE_CEILING - 4096 {
            return Err(JtError::Config(format!(
                "chunking.chunk_size {} must stay below the {DOCUMENT_SIZE_CEILING} byte document ceiling",
                self.chunking.chunk_size
            )));
        }
        if self.storage.remote == Some(self.storage.primary) {
            return Err(JtError::Config(format!(
                "storage.remote cannot be the primary backend ({})",
                self.storage.primary
            )));
        }
        if self.autosync.interval_seconds == 0 {
            return Err(JtError::Config(
                "autosync.interval_seconds must be positive".to_string(),
            ));
        }
        if self.network.timeout_seconds == 0 {
            return Err(JtError::Config(
                "network.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend that owns the collection.
    pub primary: BackendKind,
    /// Probed in order when the primary is empty.
    #[serde(default)]
    pub fallbacks: Vec<BackendKind>,
    /// Compared against the primary at startup and mirrored on save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<BackendKind>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            primary: BackendKind::Local,
            fallbacks: vec![BackendKind::Database, BackendKind::Local],
            remote: None,
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.primary {
            self.primary = value;
        }
        if let Some(values) = patch.fallbacks {
            self.fallbacks = values;
        }
        if let Some(value) = patch.remote {
            self.remote = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    pub key: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            key: "applications".to_string(),
        }
    }
}

impl LocalConfig {
    fn merge(&mut self, patch: LocalPatch) {
        if let Some(value) = patch.key {
            self.key = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Relative paths resolve against the data root.
    pub file: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: "jt.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    fn merge(&mut self, patch: DatabasePatch) {
        if let Some(value) = patch.file {
            self.file = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub base_url: String,
    pub database: String,
    pub token_env: String,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            database: "(default)".to_string(),
            token_env: "JT_FIRESTORE_TOKEN".to_string(),
        }
    }
}

impl FirestoreConfig {
    fn merge(&mut self, patch: FirestorePatch) {
        if let Some(value) = patch.project_id {
            self.project_id = Some(value);
        }
        if let Some(value) = patch.base_url {
            self.base_url = value;
        }
        if let Some(value) = patch.database {
            self.database = value;
        }
        if let Some(value) = patch.token_env {
            self.token_env = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gist_id: Option<String>,
    pub api_url: String,
    pub token_env: String,
    pub file_name: String,
}

impl Default for GistConfig {
    fn default() -> Self {
        Self {
            gist_id: None,
            api_url: "https://api.github.com".to_string(),
            token_env: "JT_GIST_TOKEN".to_string(),
            file_name: "job-applications-data.json".to_string(),
        }
    }
}

impl GistConfig {
    fn merge(&mut self, patch: GistPatch) {
        if let Some(value) = patch.gist_id {
            self.gist_id = Some(value);
        }
        if let Some(value) = patch.api_url {
            self.api_url = value;
        }
        if let Some(value) = patch.token_env {
            self.token_env = value;
        }
        if let Some(value) = patch.file_name {
            self.file_name = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    pub api_url: String,
    pub token_env: String,
    pub folder_name: String,
    pub file_name: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_url: "https://www.googleapis.com".to_string(),
            token_env: "JT_DRIVE_TOKEN".to_string(),
            folder_name: "Job-Tracker-Data".to_string(),
            file_name: "applications.json".to_string(),
        }
    }
}

impl DriveConfig {
    fn merge(&mut self, patch: DrivePatch) {
        if let Some(value) = patch.api_url {
            self.api_url = value;
        }
        if let Some(value) = patch.token_env {
            self.token_env = value;
        }
        if let Some(value) = patch.folder_name {
            self.folder_name = value;
        }
        if let Some(value) = patch.file_name {
            self.file_name = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Bytes of payload text per chunk document.
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800_000,
        }
    }
}

impl ChunkingConfig {
    fn merge(&mut self, patch: ChunkingPatch) {
        if let Some(value) = patch.chunk_size {
            self.chunk_size = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosyncConfig {
    pub interval_seconds: u64,
    /// Skip a tick when the collection digest matches the last save.
    pub skip_unchanged: bool,
}

impl Default for AutosyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            skip_unchanged: false,
        }
    }
}

impl AutosyncConfig {
    fn merge(&mut self, patch: AutosyncPatch) {
        if let Some(value) = patch.interval_seconds {
            self.interval_seconds = value;
        }
        if let Some(value) = patch.skip_unchanged {
            self.skip_unchanged = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub timeout_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl NetworkConfig {
    fn merge(&mut self, patch: NetworkPatch) {
        if let Some(value) = patch.timeout_seconds {
            self.timeout_seconds = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub storage: Option<StoragePatch>,
    pub local: Option<LocalPatch>,
    pub database: Option<DatabasePatch>,
    pub firestore: Option<FirestorePatch>,
    pub gist: Option<GistPatch>,
    pub drive: Option<DrivePatch>,
    pub chunking: Option<ChunkingPatch>,
    pub autosync: Option<AutosyncPatch>,
    pub network: Option<NetworkPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub primary: Option<BackendKind>,
    pub fallbacks: Option<Vec<BackendKind>>,
    #[serde(default, deserialize_with = "deserialize_remote")]
    pub remote: Option<Option<BackendKind>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LocalPatch {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabasePatch {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FirestorePatch {
    pub project_id: Option<String>,
    pub base_url: Option<String>,
    pub database: Option<String>,
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GistPatch {
    pub gist_id: Option<String>,
    pub api_url: Option<String>,
    pub token_env: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DrivePatch {
    pub api_url: Option<String>,
    pub token_env: Option<String>,
    pub folder_name: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChunkingPatch {
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AutosyncPatch {
    pub interval_seconds: Option<u64>,
    pub skip_unchanged: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NetworkPatch {
    pub timeout_seconds: Option<u64>,
}

/// `remote = "none"` in a later layer clears a remote set by an earlier one.
fn deserialize_remote<'de, D>(deserializer: D) -> std::result::Result<Option<Option<BackendKind>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_optional_backend(&raw)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

fn parse_optional_backend(value: &str) -> Result<Option<BackendKind>> {
    match value.trim().to_lowercase().as_str() {
        "" | "none" | "off" => Ok(None),
        other => other.parse().map(Some),
    }
}

fn env_bool(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    env(key).map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_u64(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match env(key) {
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| JtError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

fn env_usize(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<usize>> {
    match env(key) {
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|err| JtError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

fn env_list(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<Vec<String>> {
    env(key).map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}
