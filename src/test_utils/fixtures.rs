use std::path::PathBuf;

use tempfile::TempDir;

use crate::config::Config;
use crate::storage::BackendKind;

/// Test fixture providing an isolated data root.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl UnitTestFixture {
    /// # Panics
    /// If a temp directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    /// Create a file under the root.
    ///
    /// # Panics
    /// If the file cannot be written.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Config that only touches local backends under this root.
    #[must_use]
    pub fn config(&self, primary: BackendKind, fallbacks: &[BackendKind]) -> Config {
        let mut config = Config::default();
        config.storage.primary = primary;
        config.storage.fallbacks = fallbacks.to_vec();
        config.storage.remote = None;
        config
    }
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}
