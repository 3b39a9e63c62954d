// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full multi-label workflow in order:
//
//   Step 1: Load the dataset              (Layer 4 - data)
//   Step 2: Check it is multi-label       (Layer 3 - domain)
//   Step 3: Split train/validation        (Layer 4 - data, optional)
//   Step 4: Build the model               (Layer 5 - ml)
//   Step 5: Wrap it in a Learner          (Layer 5 - ml)
//   Step 6: Learning-rate sweep           (Layer 5 - ml, optional)
//   Step 7: Fit                           (Layer 5 - ml)
//   Step 8: Inspect top losses + validate (Layer 5 - ml)
//   Step 9: Save config + weights         (Layer 6 - infra, optional)
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::data::{
    splitter::split_dataset,
    synthetic::{SyntheticMultilabel, MAX_FEATURES, MAX_LEN, NUM_CLASSES},
};
use crate::domain::{
    dataset::{is_multilabel, MultiLabelDataset},
    history::History,
    report::{TopLoss, ValidationReport},
    traits::DatasetSource,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    default_device,
    learner::{get_learner, Learner},
    lr_finder::{LrFindConfig, LrFinderResult},
    model::MultiLabelClassifierConfig,
    TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a run. Serialisable so it can be loaded
// from JSON and saved next to a checkpoint for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Padded length of every token row
    pub max_len:        usize,
    /// Highest token id (vocabulary size is max_features + 1)
    pub max_features:   usize,
    pub num_classes:    usize,
    pub embed_dim:      usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub seed:           u64,
    /// Fraction of rows held out for validation; 0.0 validates on
    /// the training rows themselves
    pub val_fraction:   f64,
    /// Rows shown by view_top_losses
    pub top_losses:     usize,
    /// Run the learning-rate sweep before fitting
    pub lr_find:        bool,
    pub lr_find_iters:  usize,
    pub checkpoint_dir: Option<String>,
    pub metrics_dir:    Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_len:        MAX_LEN,
            max_features:   MAX_FEATURES,
            num_classes:    NUM_CLASSES,
            embed_dim:      50,
            batch_size:     1,
            epochs:         200,
            lr:             0.001,
            seed:           42,
            val_fraction:   0.0,
            top_losses:     5,
            lr_find:        true,
            lr_find_iters:  100,
            checkpoint_dir: None,
            metrics_dir:    None,
        }
    }
}

impl TrainConfig {
    /// Read a config from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &str) -> Result<Self> {
        use anyhow::Context;
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config from '{path}'"))?;
        Ok(serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{path}'"))?)
    }

    pub fn model_config(&self) -> MultiLabelClassifierConfig {
        MultiLabelClassifierConfig::new(self.max_features + 1, self.num_classes)
            .with_embed_dim(self.embed_dim)
    }

    pub fn lr_find_config(&self) -> LrFindConfig {
        LrFindConfig::default().with_num_iter(self.lr_find_iters)
    }
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub lr_find:    Option<LrFinderResult>,
    pub history:    History,
    pub top_losses: Vec<TopLoss>,
    pub validation: ValidationReport,
}

impl TrainReport {
    pub fn final_val_loss(&self) -> Option<f64> {
        self.history.final_val_loss()
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase<S: DatasetSource = SyntheticMultilabel> {
    config: TrainConfig,
    source: S,
}

impl TrainUseCase<SyntheticMultilabel> {
    pub fn new(config: TrainConfig) -> Self {
        Self::with_source(config, SyntheticMultilabel)
    }
}

impl<S: DatasetSource> TrainUseCase<S> {
    pub fn with_source(config: TrainConfig, source: S) -> Self {
        Self { config, source }
    }

    /// Run the workflow on the configured backend's default device
    pub fn execute(&self) -> Result<TrainReport> {
        self.execute_on::<TrainBackend>(default_device())
    }

    /// Run the workflow on an explicit backend and device
    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1-2: Load and inspect the data ───────────────────────────────
        let dataset = self.source.load()?;
        check_dataset(cfg, &dataset)?;
        if is_multilabel(dataset.features(), dataset.labels())? {
            tracing::info!("Detected multi-label problem: {} rows, {} classes", dataset.len(), dataset.num_classes());
        } else {
            tracing::warn!("Labels look single-label (one-hot); training with per-class sigmoid anyway");
        }

        // ── Step 3: Train / validation data ───────────────────────────────────
        let (train, val) = if cfg.val_fraction > 0.0 {
            split_dataset(&dataset, 1.0 - cfg.val_fraction, cfg.seed)?
        } else {
            (dataset.clone(), dataset)
        };

        // ── Step 4-5: Model + learner ─────────────────────────────────────────
        B::seed(cfg.seed);
        let model = cfg.model_config().init::<B>(&device);
        let mut learner = get_learner(model, train, val, cfg.batch_size, device)?.with_seed(cfg.seed);
        if let Some(dir) = &cfg.metrics_dir {
            let logger = MetricsLogger::new(dir.clone())?;
            tracing::info!("Logging epoch metrics to '{}'", logger.csv_path().display());
            learner = learner.with_metrics_logger(logger);
        }

        // ── Step 6: Learning-rate sweep ───────────────────────────────────────
        let lr_find = if cfg.lr_find {
            Some(learner.lr_find(cfg.lr_find_config())?)
        } else {
            None
        };

        // ── Step 7: Fit ───────────────────────────────────────────────────────
        let history = learner.fit(cfg.lr, cfg.epochs)?;

        // ── Step 8: Inspect ───────────────────────────────────────────────────
        let top_losses = learner.view_top_losses(cfg.top_losses)?;
        let validation = learner.validate()?;

        // ── Step 9: Persist ───────────────────────────────────────────────────
        if let Some(dir) = &cfg.checkpoint_dir {
            save_checkpoint(dir, cfg, &learner)?;
        }

        Ok(TrainReport { lr_find, history, top_losses, validation })
    }
}

fn check_dataset(cfg: &TrainConfig, dataset: &MultiLabelDataset) -> Result<()> {
    ensure!(
        dataset.seq_len() == cfg.max_len,
        "dataset rows have length {}, config expects max_len={}",
        dataset.seq_len(), cfg.max_len,
    );
    ensure!(
        dataset.num_classes() == cfg.num_classes,
        "dataset has {} classes, config expects num_classes={}",
        dataset.num_classes(), cfg.num_classes,
    );
    Ok(())
}

fn save_checkpoint<B: AutodiffBackend>(dir: &str, cfg: &TrainConfig, learner: &Learner<B>) -> Result<()> {
    let ckpt = CheckpointManager::new(dir)?;
    ckpt.save_config(cfg)?;
    ckpt.save_model(learner.model(), "final")?;
    tracing::info!("Checkpoint saved to '{}'", dir);
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::backend::Backend;

    use crate::data::synthetic::synthetic_multilabel;
    use crate::ml::backend_rng_guard;

    type TestBackend = Autodiff<NdArray>;

    /// The full workflow: detect, build, sweep, fit 200 epochs at
    /// lr 0.001 with batch size 1, inspect, validate, and check the
    /// final validation loss.
    #[test]
    fn test_multilabel() {
        let dataset = synthetic_multilabel().unwrap();
        assert!(is_multilabel(dataset.features(), dataset.labels()).unwrap());
        assert_eq!(dataset.features().len(), 20);
        assert_eq!(dataset.labels().len(), 20);
        assert_eq!(dataset.seq_len(), MAX_LEN);
        assert_eq!(dataset.num_classes(), NUM_CLASSES);

        let device = Default::default();
        let model = {
            let _rng = backend_rng_guard();
            TestBackend::seed(42);
            MultiLabelClassifierConfig::new(MAX_FEATURES + 1, NUM_CLASSES)
                .with_embed_dim(50)
                .init::<TestBackend>(&device)
        };
        let mut learner = get_learner(model, dataset.clone(), dataset, 1, device).unwrap();
        learner.lr_find(LrFindConfig::default()).unwrap();

        let hist = learner.fit(0.001, 200).unwrap();
        let top = learner.view_top_losses(5).unwrap();
        assert!(top.len() <= 5);
        assert!(top.windows(2).all(|w| w[0].loss >= w[1].loss));
        learner.validate().unwrap();

        let final_loss = *hist.val_loss().last().unwrap();
        println!("final_loss:{final_loss}");
        assert!(final_loss < 0.05, "final validation loss {final_loss} is not below 0.05");
    }

    #[test]
    fn test_use_case_short_run_with_checkpoint() {
        let _rng = backend_rng_guard();
        let dir = std::env::temp_dir().join(format!("mll-train-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let cfg = TrainConfig {
            embed_dim:      8,
            batch_size:     4,
            epochs:         3,
            lr:             0.01,
            lr_find_iters:  20,
            checkpoint_dir: Some(dir.join("ckpt").to_string_lossy().to_string()),
            metrics_dir:    Some(dir.join("metrics").to_string_lossy().to_string()),
            ..TrainConfig::default()
        };
        let report = TrainUseCase::new(cfg).execute_on::<TestBackend>(Default::default()).unwrap();

        assert_eq!(report.history.len(), 3);
        assert!(report.lr_find.as_ref().is_some_and(|r| !r.is_empty()));
        assert_eq!(report.top_losses.len(), 5);
        assert_eq!(report.validation.num_samples, 20);
        assert!(dir.join("ckpt").join("train_config.json").exists());
        assert!(dir.join("ckpt").join("latest.json").exists());

        let csv = std::fs::read_to_string(dir.join("metrics").join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_held_out_validation_split() {
        let _rng = backend_rng_guard();
        let cfg = TrainConfig {
            embed_dim:    8,
            batch_size:   5,
            epochs:       1,
            val_fraction: 0.25,
            lr_find:      false,
            ..TrainConfig::default()
        };
        let report = TrainUseCase::new(cfg).execute_on::<TestBackend>(Default::default()).unwrap();
        assert_eq!(report.validation.num_samples, 5);
        assert!(report.lr_find.is_none());
    }

    struct OneHotSource;

    impl DatasetSource for OneHotSource {
        fn load(&self) -> Result<MultiLabelDataset> {
            Ok(MultiLabelDataset::new(
                vec![vec![1, 0], vec![2, 0], vec![2, 1]],
                vec![vec![1, 0], vec![0, 1], vec![0, 1]],
            )?)
        }
    }

    #[test]
    fn test_custom_source() {
        let _rng = backend_rng_guard();
        let cfg = TrainConfig {
            max_len:      2,
            max_features: 2,
            num_classes:  2,
            embed_dim:    4,
            epochs:       2,
            lr_find:      false,
            top_losses:   2,
            ..TrainConfig::default()
        };
        let report = TrainUseCase::with_source(cfg, OneHotSource)
            .execute_on::<TestBackend>(Default::default())
            .unwrap();
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.top_losses.len(), 2);
        assert!(report.final_val_loss().is_some());
    }

    #[test]
    fn test_config_must_match_dataset() {
        let cfg = TrainConfig { max_len: 9, epochs: 1, ..TrainConfig::default() };
        let err = TrainUseCase::new(cfg).execute_on::<TestBackend>(Default::default()).unwrap_err();
        assert!(err.to_string().contains("max_len=9"));
    }

    #[test]
    fn test_config_json_defaults_missing_fields() {
        let cfg: TrainConfig = serde_json::from_str(r#"{ "epochs": 10, "lr": 0.01 }"#).unwrap();
        assert_eq!(cfg.epochs, 10);
        assert_eq!(cfg.lr, 0.01);
        assert_eq!(cfg.batch_size, 1);
        assert_eq!(cfg.embed_dim, 50);
        assert!(cfg.checkpoint_dir.is_none());
    }
}
