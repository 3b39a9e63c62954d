// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits instead
// of concrete types:
//   - SyntheticMultilabel implements DatasetSource
//   - Learner and Predictor both implement MultiLabelScorer
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::dataset::MultiLabelDataset;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can produce a validated multi-label dataset.
///
/// Implementations:
///   - SyntheticMultilabel → the fixed 20-row in-memory dataset
pub trait DatasetSource {
    fn load(&self) -> Result<MultiLabelDataset>;
}

// ─── MultiLabelScorer ─────────────────────────────────────────────────────────
/// Any component that turns token rows into per-class probabilities.
///
/// Implementations:
///   - Learner   → scores with the model it is training
///   - Predictor → scores with a model restored from a checkpoint
pub trait MultiLabelScorer {
    /// One probability vector (length = number of classes) per input row.
    fn predict(&self, rows: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}
