//! Model selection, threshold clamping and prediction

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DEFAULT_THRESHOLD, MAX_THRESHOLD, MIN_THRESHOLD};
use crate::data::{coerce_field, RawRecord};
use crate::error::{LoanRiskError, Result};
use crate::storage::{load_typed, ArtifactStore, LOGREG_KEY, TREE_KEY};
use crate::training::{CartLearner, LogisticArtifact, TreeAdapter, TreeArtifact, TreeLearner};

/// The two servable model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Logreg,
    Tree,
}

impl ModelKind {
    /// Store key and wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Logreg => LOGREG_KEY,
            ModelKind::Tree => TREE_KEY,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = LoanRiskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logreg" => Ok(ModelKind::Logreg),
            "tree" => Ok(ModelKind::Tree),
            _ => Err(LoanRiskError::UnknownModel(s.to_string())),
        }
    }
}

/// Clamp a caller threshold into `[0.1, 0.9]`; missing or non-finite values use 0.5
pub fn clamp_threshold(threshold: Option<f64>) -> f64 {
    let t = match threshold {
        Some(t) if t.is_finite() => t,
        _ => DEFAULT_THRESHOLD,
    };
    t.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

/// Inputs echoed back with a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Coerced feature values used for scoring
    pub features: BTreeMap<String, f64>,
    /// Threshold after clamping
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub model: ModelKind,
    pub probability: f64,
    pub label: u8,
    pub explanation: Explanation,
}

/// Routes predictions to the persisted logistic or tree artifact
pub struct InferenceDispatcher<L: TreeLearner = CartLearner> {
    store: Arc<dyn ArtifactStore>,
    tree: TreeAdapter<L>,
}

impl InferenceDispatcher<CartLearner> {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            tree: TreeAdapter::new(CartLearner::default()),
        }
    }
}

impl<L: TreeLearner> InferenceDispatcher<L> {
    /// Dispatcher whose tree artifacts were produced by `learner`
    pub fn with_learner(store: Arc<dyn ArtifactStore>, learner: L) -> Self {
        Self {
            store,
            tree: TreeAdapter::new(learner),
        }
    }

    /// Whether an artifact exists for `kind`
    pub fn is_ready(&self, kind: ModelKind) -> bool {
        self.store.exists(kind.as_str())
    }

    /// Parse `model` and predict
    pub fn predict_named(&self, model: &str, record: &RawRecord, threshold: Option<f64>) -> Result<Prediction> {
        self.predict(model.parse()?, record, threshold)
    }

    /// Score one raw record. Fails with `NotReady` if `kind` was never trained.
    pub fn predict(&self, kind: ModelKind, record: &RawRecord, threshold: Option<f64>) -> Result<Prediction> {
        let threshold = clamp_threshold(threshold);

        let (features, probability) = match kind {
            ModelKind::Logreg => {
                let artifact: LogisticArtifact = self.load(kind)?;
                let p = artifact.predict_record(record)?;
                (artifact.features, p)
            }
            ModelKind::Tree => {
                let artifact: TreeArtifact = self.load(kind)?;
                let p = self.tree.predict_record(&artifact, record)?;
                (artifact.features, p)
            }
        };

        let label = u8::from(probability >= threshold);
        debug!(model = %kind, probability, threshold, label, "Prediction");

        Ok(Prediction {
            model: kind,
            probability,
            label,
            explanation: Explanation {
                features: features
                    .into_iter()
                    .map(|name| {
                        let value = coerce_field(record, &name);
                        (name, value)
                    })
                    .collect(),
                threshold,
            },
        })
    }

    fn load<T: serde::de::DeserializeOwned>(&self, kind: ModelKind) -> Result<T> {
        load_typed(self.store.as_ref(), kind.as_str()).map_err(|e| match e {
            LoanRiskError::NotFound(_) => LoanRiskError::NotReady(kind.to_string()),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::storage::{save_typed, MemoryStore};
    use crate::training::TrainEngine;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn logistic_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let artifact = LogisticArtifact {
            features: vec!["a".to_string()],
            means: vec![0.0],
            sigmas: vec![1.0],
            weights: vec![0.0, 1.0],
        };
        save_typed(store.as_ref(), LOGREG_KEY, &artifact).unwrap();
        store
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!("logreg".parse::<ModelKind>().unwrap(), ModelKind::Logreg);
        assert_eq!("Tree".parse::<ModelKind>().unwrap(), ModelKind::Tree);
        assert!(matches!(
            "forest".parse::<ModelKind>(),
            Err(LoanRiskError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_clamp_threshold() {
        assert_eq!(clamp_threshold(None), 0.5);
        assert_eq!(clamp_threshold(Some(0.0)), 0.1);
        assert_eq!(clamp_threshold(Some(5.0)), 0.9);
        assert_eq!(clamp_threshold(Some(0.3)), 0.3);
        assert_eq!(clamp_threshold(Some(f64::NAN)), 0.5);
    }

    #[test]
    fn test_not_ready_before_training() {
        let dispatcher = InferenceDispatcher::new(Arc::new(MemoryStore::new()));
        let err = dispatcher.predict(ModelKind::Tree, &RawRecord::new(), None).unwrap_err();
        assert!(matches!(err, LoanRiskError::NotReady(ref m) if m == "tree"));
        assert_eq!(err.to_string(), "tree model not trained yet");
    }

    #[test]
    fn test_threshold_clamp_equivalence() {
        let dispatcher = InferenceDispatcher::new(logistic_store());
        // sigmoid(-2.5) ~ 0.076, sigmoid(-2.0) ~ 0.119
        for a in [-2.5, -2.0, 0.0, 2.0, 2.5] {
            let r = record(json!({ "a": a }));
            let low = dispatcher.predict(ModelKind::Logreg, &r, Some(0.0)).unwrap();
            let floor = dispatcher.predict(ModelKind::Logreg, &r, Some(0.1)).unwrap();
            assert_eq!(low, floor);
            let high = dispatcher.predict(ModelKind::Logreg, &r, Some(5.0)).unwrap();
            let ceil = dispatcher.predict(ModelKind::Logreg, &r, Some(0.9)).unwrap();
            assert_eq!(high, ceil);
        }
    }

    #[test]
    fn test_label_uses_threshold() {
        let dispatcher = InferenceDispatcher::new(logistic_store());
        let r = record(json!({ "a": "0" }));
        let p = dispatcher.predict(ModelKind::Logreg, &r, None).unwrap();
        assert!((p.probability - 0.5).abs() < 1e-12);
        assert_eq!(p.label, 1);
        assert_eq!(p.explanation.features["a"], 0.0);

        let p = dispatcher.predict(ModelKind::Logreg, &r, Some(0.6)).unwrap();
        assert_eq!(p.label, 0);
        assert_eq!(p.explanation.threshold, 0.6);
    }

    #[test]
    fn test_tree_prediction_after_training() {
        let store = Arc::new(MemoryStore::new());
        let records: Vec<RawRecord> = (0..30)
            .map(|i| {
                let y = i % 3 == 0;
                record(json!({
                    "Age": 30, "Income": 4000,
                    "LoanAmount": if y { 9000 } else { 1000 },
                    "CreditScore": 650, "Default": u8::from(y)
                }))
            })
            .collect();
        TrainEngine::new(PipelineConfig::default(), store.clone())
            .train_records(&records)
            .unwrap();

        let dispatcher = InferenceDispatcher::new(store);
        let high = record(json!({"LoanAmount": 9000, "Age": 30, "Income": 4000, "CreditScore": 650}));
        let p = dispatcher.predict_named("tree", &high, Some(0.5)).unwrap();
        assert_eq!(p.model, ModelKind::Tree);
        assert_eq!(p.probability, 1.0);
        assert_eq!(p.label, 1);
        assert!(dispatcher.is_ready(ModelKind::Logreg));
    }
}
