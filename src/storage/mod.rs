//! Artifact persistence
//!
//! Each key maps to exactly one JSON document. `save` overwrites, `load` on
//! an absent key returns [`LoanRiskError::NotFound`].

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{LoanRiskError, Result};

/// Key of the logistic model artifact
pub const LOGREG_KEY: &str = "logreg";
/// Key of the tree model artifact
pub const TREE_KEY: &str = "tree";
/// Key of the dataset summary record
pub const SUMMARY_KEY: &str = "summary";
/// Key of the last metrics records for both models
pub const METRICS_KEY: &str = "metrics";

/// Key-value blob store for trained artifacts
pub trait ArtifactStore: Send + Sync {
    /// Replace whatever is stored under `key`
    fn save(&self, key: &str, artifact: &Value) -> Result<()>;

    /// Fetch the artifact stored under `key`
    fn load(&self, key: &str) -> Result<Value>;

    /// Whether `key` currently has an artifact
    fn exists(&self, key: &str) -> bool;

    /// Human-readable location, for logs and health output
    fn describe(&self) -> String;
}

/// Serialize and save a typed artifact
pub fn save_typed<T: Serialize + ?Sized>(store: &dyn ArtifactStore, key: &str, artifact: &T) -> Result<()> {
    store.save(key, &serde_json::to_value(artifact)?)
}

/// Load and deserialize a typed artifact
pub fn load_typed<T: DeserializeOwned>(store: &dyn ArtifactStore, key: &str) -> Result<T> {
    let value = store.load(key)?;
    serde_json::from_value(value).map_err(LoanRiskError::from)
}

/// Load a typed artifact, treating an absent key as `None`
pub fn load_optional<T: DeserializeOwned>(store: &dyn ArtifactStore, key: &str) -> Result<Option<T>> {
    match load_typed(store, key) {
        Ok(v) => Ok(Some(v)),
        Err(LoanRiskError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(LoanRiskError::ValidationError(format!("invalid artifact key: {:?}", key)))
    }
}
