//! Serving-time inference
//!
//! Loads persisted artifacts on every call; no fitted state is held in
//! memory, so concurrent requests need no coordination.

mod dispatcher;

pub use dispatcher::{clamp_threshold, Explanation, InferenceDispatcher, ModelKind, Prediction};

/// Threshold applied when the caller supplies none
pub const DEFAULT_THRESHOLD: f64 = 0.5;
/// Lowest accepted decision threshold
pub const MIN_THRESHOLD: f64 = 0.1;
/// Highest accepted decision threshold
pub const MAX_THRESHOLD: f64 = 0.9;
