// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved per checkpoint:
//   1. Model weights (.mpk.gz file) — all learned parameters
//   2. latest.json                  — tag of the last saved weights
//   3. train_config.json            — the run configuration
//
// The config is needed to rebuild the exact architecture
// (vocabulary size, embedding width, class count) before the
// weights can be loaded into it.
//
// File naming convention:
//   checkpoints/
//     model_final.mpk.gz     ← weights tagged "final"
//     latest.json            ← "final"
//     train_config.json      ← TrainConfig as pretty JSON
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{ensure, Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::MultiLabelClassifier;

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory
    /// if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open a directory written by a previous run. Unlike `new`,
    /// a missing directory is an error and nothing is created.
    pub fn open(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        ensure!(dir.is_dir(), "Checkpoint directory '{}' does not exist", dir.display());
        Ok(Self { dir })
    }

    /// Save model weights under `tag` and point latest.json at them.
    /// Writes {dir}/model_{tag}.mpk.gz
    pub fn save_model<B: Backend>(
        &self,
        model: &MultiLabelClassifier<B>,
        tag:   &str,
    ) -> Result<()> {
        // Path without extension — the recorder adds it
        let path = self.dir.join(format!("model_{tag}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join("latest.json");
        fs::write(&latest_path, serde_json::to_string(tag)?)
            .with_context(|| "Failed to write latest.json")?;

        tracing::debug!("Saved checkpoint '{}'", tag);
        Ok(())
    }

    /// Load the latest saved weights into `model`.
    ///
    /// The model must have the architecture the checkpoint was
    /// saved with, or loading fails.
    pub fn load_model<B: Backend>(
        &self,
        model:  MultiLabelClassifier<B>,
        device: &B::Device,
    ) -> Result<MultiLabelClassifier<B>> {
        let tag  = self.latest_tag()?;
        let path = self.dir.join(format!("model_{tag}"));

        tracing::info!("Loading checkpoint '{}'", tag);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Save the run configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the run configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' with --checkpoint-dir first.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    fn latest_tag(&self) -> Result<String> {
        let path = self.dir.join("latest.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest.json'. \
                 Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str::<String>(&s)?)
    }
}
