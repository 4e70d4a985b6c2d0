//! Model training
//!
//! - Seeded train/test partitioning
//! - Logistic regression by full-batch gradient descent
//! - CART decision tree behind the [`TreeLearner`] capability
//! - Confusion-matrix metrics
//! - [`TrainEngine`], which runs the whole Train operation

pub mod decision_tree;
pub mod engine;
pub mod logistic;
pub mod metrics;
pub mod split;
pub mod tree_adapter;

pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{TrainEngine, TrainOutcome};
pub use logistic::{sigmoid, LogisticArtifact, LogisticTrainer};
pub use metrics::{ConfusionMatrix, Metrics};
pub use split::{split, split_with, FixedSequence, RandomSource, SeededRandom, Split};
pub use tree_adapter::{CartLearner, TreeAdapter, TreeArtifact, TreeLearner};
