//! JSON files on the local file system

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{check_key, ArtifactStore};
use crate::error::{LoanRiskError, Result};

/// One pretty-printed `<key>.json` file per artifact under a base directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn artifact_file(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

impl ArtifactStore for LocalStore {
    fn save(&self, key: &str, artifact: &Value) -> Result<()> {
        check_key(key)?;
        fs::create_dir_all(&self.base_dir)?;

        let path = self.artifact_file(key);
        let tmp = self.base_dir.join(format!(".{}.json.tmp", key));
        let json = serde_json::to_string_pretty(artifact)?;

        // Readers see either the old file or the new one, never a partial write.
        fs::write(&tmp, json.as_bytes())?;
        fs::rename(&tmp, &path)?;

        debug!(key = key, path = %path.display(), bytes = json.len(), "Saved artifact");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Value> {
        check_key(key)?;
        let path = self.artifact_file(key);

        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoanRiskError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&contents)?)
    }

    fn exists(&self, key: &str) -> bool {
        check_key(key).is_ok() && self.artifact_file(key).is_file()
    }

    fn describe(&self) -> String {
        self.base_dir.display().to_string()
    }
}
