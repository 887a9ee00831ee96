use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{JtError, Result};
use crate::store::RecordStore;
use crate::sync::StartupReport;

/// Everything a command needs besides its own arguments.
pub struct AppContext {
    /// Data directory holding the local cache, database and sync state
    pub root: PathBuf,
    pub config: Config,
    /// Where `config init` writes
    pub config_path: PathBuf,
    pub robot_mode: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = Self::root_dir()?;
        std::fs::create_dir_all(&root)?;
        let config = Config::load(cli.config.as_deref(), &root)?;
        let config_path = Self::config_path_for(cli.config.as_deref(), &root);
        debug!(root = %root.display(), config = %config_path.display(), "context ready");
        Ok(Self {
            root,
            config,
            config_path,
            robot_mode: cli.robot,
        })
    }

    /// `JT_ROOT`, else the per-user data directory.
    pub fn root_dir() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("JT_ROOT") {
            if !root.trim().is_empty() {
                return Ok(PathBuf::from(root));
            }
        }
        dirs::data_dir()
            .map(|dir| dir.join("jt"))
            .ok_or_else(|| JtError::MissingConfig("data directory (set JT_ROOT)".to_string()))
    }

    fn config_path_for(explicit: Option<&Path>, root: &Path) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("JT_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| Config::project_path(root))
    }

    /// Open the configured backends and run the startup sync.
    #[must_use]
    pub fn open_store(&self) -> (RecordStore, StartupReport) {
        RecordStore::open(&self.config, &self.root)
    }
}
