// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// system works with:
//
//   dataset.rs  — the validated (features, labels) pair and the
//                 multi-label detector
//   history.rs  — per-epoch training records returned by fit()
//   report.rs   — validation and top-loss results
//   traits.rs   — abstractions implemented by other layers
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust data and the checks that keep it valid
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Validated multi-label dataset and shape errors
pub mod dataset;

/// Training history (one record per epoch)
pub mod history;

/// Validation report and top-loss records
pub mod report;

/// Core abstractions (traits) that other layers implement
pub mod traits;
