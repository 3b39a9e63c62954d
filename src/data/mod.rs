// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the fixed token/label matrices and the
// tensor batches the learner trains on:
//
//   SyntheticMultilabel → 20 × 7 tokens, 20 × 4 labels
//       │
//       ▼
//   split_dataset       → optional seeded train/validation split
//       │
//       ▼
//   SequenceDataset     → implements Burn's Dataset trait
//       │
//       ▼
//   MultiLabelBatcher   → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader          → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// The fixed synthetic multi-label dataset
pub mod synthetic;

/// Implements Burn's Dataset trait for multi-label samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded shuffle and train/validation split
pub mod splitter;
