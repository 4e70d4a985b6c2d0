//! Application state shared across handlers

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::inference::InferenceDispatcher;
use crate::storage::{ArtifactStore, LocalStore};

use super::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: PipelineConfig,
    pub store: Arc<dyn ArtifactStore>,
    pub dispatcher: InferenceDispatcher,
    /// Held for the duration of a training run so runs do not interleave their writes
    pub training_lock: Mutex<()>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// State backed by JSON files under `config.artifact_dir`
    pub fn new(config: ServerConfig) -> Result<Self> {
        let store: Arc<dyn ArtifactStore> = Arc::new(LocalStore::new(&config.artifact_dir)?);
        Ok(Self::with_store(config, PipelineConfig::default(), store))
    }

    pub fn with_store(config: ServerConfig, pipeline: PipelineConfig, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            config,
            pipeline,
            dispatcher: InferenceDispatcher::new(Arc::clone(&store)),
            store,
            training_lock: Mutex::new(()),
            started_at: chrono::Utc::now(),
        }
    }
}
