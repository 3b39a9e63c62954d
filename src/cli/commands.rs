// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `lr-find` and
// `predict`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the multi-label classifier on the synthetic dataset
    Train(TrainArgs),

    /// Run only the learning-rate sweep and print suggestions
    LrFind(LrFindArgs),

    /// Score a token sequence with a saved checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Load every setting from this JSON file instead of the flags below
    #[arg(long)]
    pub config: Option<String>,

    /// Width of each token embedding
    #[arg(long, default_value_t = 50)]
    pub embed_dim: usize,

    /// Number of samples per gradient step
    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 200)]
    pub epochs: usize,

    /// Constant learning rate used by fit
    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// Seed for weight init, shuffling and splitting
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows held out for validation (0 = validate on training rows)
    #[arg(long, default_value_t = 0.0)]
    pub val_fraction: f64,

    /// Number of highest-loss validation rows to show
    #[arg(long, default_value_t = 5)]
    pub top_losses: usize,

    /// Skip the learning-rate sweep before training
    #[arg(long)]
    pub skip_lr_find: bool,

    /// Maximum number of batches in the learning-rate sweep
    #[arg(long, default_value_t = 100)]
    pub lr_find_iters: usize,

    /// Save config and final weights here
    #[arg(long)]
    pub checkpoint_dir: Option<String>,

    /// Append per-epoch metrics to <dir>/metrics.csv
    #[arg(long)]
    pub metrics_dir: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            embed_dim:      a.embed_dim,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            seed:           a.seed,
            val_fraction:   a.val_fraction,
            top_losses:     a.top_losses,
            lr_find:        !a.skip_lr_find,
            lr_find_iters:  a.lr_find_iters,
            checkpoint_dir: a.checkpoint_dir,
            metrics_dir:    a.metrics_dir,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `lr-find` command
#[derive(Args, Debug)]
pub struct LrFindArgs {
    #[arg(long, default_value_t = 50)]
    pub embed_dim: usize,

    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum number of batches in the sweep
    #[arg(long, default_value_t = 100)]
    pub iters: usize,
}

impl From<LrFindArgs> for TrainConfig {
    fn from(a: LrFindArgs) -> Self {
        TrainConfig {
            embed_dim:     a.embed_dim,
            batch_size:    a.batch_size,
            seed:          a.seed,
            lr_find_iters: a.iters,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Comma-separated token ids, e.g. "1,2,3"
    #[arg(long)]
    pub tokens: String,

    /// Directory written by `train --checkpoint-dir`
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::cli::Cli;

    #[test]
    fn test_train_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "multilabel-learner", "train", "--epochs", "3", "--lr", "0.01", "--skip-lr-find",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.lr, 0.01);
        assert!(!cfg.lr_find);
        assert_eq!(cfg.max_len, 7);
    }

    #[test]
    fn test_predict_requires_tokens() {
        assert!(Cli::try_parse_from(["multilabel-learner", "predict"]).is_err());
    }
}
