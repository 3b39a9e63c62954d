// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-backed concerns used by other layers:
//
//   checkpoint.rs — model weights via Burn's CompactRecorder,
//                   plus TrainConfig as JSON so inference can
//                   rebuild the model
//
//   metrics.rs    — per-epoch metrics appended to a CSV file
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
