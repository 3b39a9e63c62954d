// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, sweeping, predicting).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The full detect → build → sweep → fit → inspect workflow
pub mod train_use_case;

// Learning-rate sweep only
pub mod lr_find_use_case;

// Scoring with a saved checkpoint
pub mod predict_use_case;
