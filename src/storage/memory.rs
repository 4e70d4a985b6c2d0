//! In-process store

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use super::{check_key, ArtifactStore};
use crate::error::{LoanRiskError, Result};

/// Artifacts held in a map; used by tests and embedded callers
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ArtifactStore for MemoryStore {
    fn save(&self, key: &str, artifact: &Value) -> Result<()> {
        check_key(key)?;
        self.entries.write().insert(key.to_string(), artifact.clone());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Value> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| LoanRiskError::NotFound(key.to_string()))
    }

    fn exists(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
