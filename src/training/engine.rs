//! Train operation: validate, summarize, split, fit both models, evaluate, persist

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::logistic::{LogisticArtifact, LogisticTrainer};
use super::metrics::Metrics;
use super::split::{split, Split};
use super::tree_adapter::{CartLearner, TreeAdapter, TreeArtifact, TreeLearner};
use crate::config::{PipelineConfig, EVALUATION_THRESHOLD};
use crate::data::{Dataset, RawRecord};
use crate::error::Result;
use crate::reports::{DatasetSummary, MetricsRecord, ModelReport};
use crate::storage::{save_typed, ArtifactStore, LOGREG_KEY, METRICS_KEY, SUMMARY_KEY, TREE_KEY};

/// Result of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainOutcome {
    pub logistic: ModelReport,
    pub tree: ModelReport,
    pub summary: DatasetSummary,
}

impl TrainOutcome {
    /// Both model reports, logistic first
    pub fn reports(&self) -> Vec<ModelReport> {
        vec![self.logistic.clone(), self.tree.clone()]
    }
}

/// Everything a run produces, held in memory until it is persisted
struct TrainedArtifacts {
    logistic: LogisticArtifact,
    tree: TreeArtifact,
    summary: DatasetSummary,
    metrics: MetricsRecord,
}

/// Orchestrates a training run against an artifact store
pub struct TrainEngine<L: TreeLearner = CartLearner> {
    config: PipelineConfig,
    store: Arc<dyn ArtifactStore>,
    tree: TreeAdapter<L>,
}

impl TrainEngine<CartLearner> {
    /// Engine using the built-in CART learner configured from `config.tree`
    pub fn new(config: PipelineConfig, store: Arc<dyn ArtifactStore>) -> Self {
        let tree = TreeAdapter::cart(config.tree.clone());
        Self { config, store, tree }
    }
}

impl<L: TreeLearner> TrainEngine<L> {
    /// Engine with a substitute tree learner
    pub fn with_learner(config: PipelineConfig, store: Arc<dyn ArtifactStore>, learner: L) -> Self {
        Self {
            config,
            store,
            tree: TreeAdapter::new(learner),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate and coerce raw records, then train
    pub fn train_records(&self, records: &[RawRecord]) -> Result<TrainOutcome> {
        self.config.validate()?;
        let dataset = Dataset::from_records(records, &self.config)?;
        self.train(&dataset)
    }

    /// Train both models on an already validated dataset.
    ///
    /// Nothing is written to the store unless every step succeeds.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainOutcome> {
        self.config.validate()?;
        let start = Instant::now();
        info!(
            rows = dataset.len(),
            features = dataset.features().len(),
            train_fraction = self.config.train_fraction,
            seed = self.config.seed,
            "Starting training run"
        );

        let artifacts = self.fit_all(dataset)?;
        self.persist(&artifacts)?;

        let outcome = TrainOutcome {
            logistic: artifacts.metrics.logreg,
            tree: artifacts.metrics.tree,
            summary: artifacts.summary,
        };

        info!(
            logreg_accuracy = outcome.logistic.metrics.accuracy,
            tree_accuracy = outcome.tree.metrics.accuracy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training run complete"
        );
        Ok(outcome)
    }

    fn fit_all(&self, dataset: &Dataset) -> Result<TrainedArtifacts> {
        let summary = DatasetSummary::from_dataset(dataset, &self.config.summary);

        let Split {
            train_indices,
            test_indices,
        } = split(dataset.len(), self.config.train_fraction, self.config.seed);
        info!(train = train_indices.len(), test = test_indices.len(), "Split dataset");

        let y_test: Vec<u8> = test_indices.iter().map(|&i| dataset.rows()[i].label()).collect();

        // Logistic regression on standardized features
        let trainer = LogisticTrainer::new()
            .with_learning_rate(self.config.learning_rate)
            .with_epochs(self.config.epochs);
        let logistic = trainer.fit(
            dataset.features(),
            &dataset.matrix(&train_indices),
            &dataset.labels(&train_indices),
        )?;
        let probabilities = logistic.predict_matrix(&dataset.matrix(&test_indices))?;
        let predicted = Metrics::labels_at(&probabilities.to_vec(), EVALUATION_THRESHOLD);
        let logistic_metrics = Metrics::compute(&y_test, &predicted)?;
        debug!(accuracy = logistic_metrics.accuracy, f1 = logistic_metrics.f1, "Evaluated logistic model");

        // Tree on raw rows
        let train_rows = dataset.select(&train_indices);
        let tree = self.tree.train(&train_rows, dataset.features(), dataset.target())?;
        let tree_probabilities = self.tree.predict_probabilities(&tree, &dataset.select(&test_indices))?;
        let tree_predicted = Metrics::labels_at(&tree_probabilities, EVALUATION_THRESHOLD);
        let tree_metrics = Metrics::compute(&y_test, &tree_predicted)?;
        debug!(accuracy = tree_metrics.accuracy, f1 = tree_metrics.f1, "Evaluated tree model");

        Ok(TrainedArtifacts {
            logistic,
            tree,
            summary,
            metrics: MetricsRecord {
                logreg: ModelReport::new(LOGREG_KEY, logistic_metrics),
                tree: ModelReport::new(TREE_KEY, tree_metrics),
            },
        })
    }

    fn persist(&self, artifacts: &TrainedArtifacts) -> Result<()> {
        let store = self.store.as_ref();
        save_typed(store, LOGREG_KEY, &artifacts.logistic)?;
        save_typed(store, TREE_KEY, &artifacts.tree)?;
        save_typed(store, SUMMARY_KEY, &artifacts.summary)?;
        save_typed(store, METRICS_KEY, &artifacts.metrics)?;
        debug!(location = %store.describe(), "Persisted artifacts");
        Ok(())
    }
}
