// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code apart
// from the batcher and checkpoint plumbing.
//
//   model.rs      — embedding → mean pool → linear → sigmoid
//                   classifier and its binary cross-entropy loss
//
//   lr_finder.rs  — learning-rate sweep schedule, loss smoothing
//                   and suggestions
//
//   learner.rs    — the Learner: lr_find, fit, view_top_losses,
//                   validate, predict
//
//   inferencer.rs — the Predictor: rebuilds a model from a
//                   checkpoint and scores token sequences
//
// Backends are chosen here once. Everything else is generic over
// Backend / AutodiffBackend and receives its device explicitly.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Embedding-pooling multi-label classifier
pub mod model;

/// Learning-rate sweep bookkeeping
pub mod lr_finder;

/// Learner facade over model + train/validation data
pub mod learner;

/// Inference from a saved checkpoint
pub mod inferencer;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

/// Default device of the configured backend
pub fn default_device() -> <InferBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

// Burn backends keep one process-wide RNG for parameter init. Tests that
// seed it or initialise models hold this lock so parallel tests cannot
// draw from it between another test's seed and init.
#[cfg(test)]
static BACKEND_RNG: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn backend_rng_guard() -> std::sync::MutexGuard<'static, ()> {
    BACKEND_RNG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
