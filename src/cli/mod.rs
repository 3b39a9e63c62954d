// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// The entry point for all user interaction. Parses arguments
// with clap and delegates to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`   — runs the full multi-label workflow
//   2. `lr-find` — runs only the learning-rate sweep
//   3. `predict` — scores a token sequence with a checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, LrFindArgs, PredictArgs, TrainArgs};

use crate::application::train_use_case::TrainConfig;

#[derive(Parser, Debug)]
#[command(
    name = "multilabel-learner",
    version = "0.1.0",
    about = "Train and inspect a small multi-label sequence classifier."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. This layer only routes
    /// and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => Self::run_train(args),
            Commands::LrFind(args)  => Self::run_lr_find(args),
            Commands::Predict(args) => Self::run_predict(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        let config = match args.config.clone() {
            Some(path) => TrainConfig::from_json_file(&path)?,
            None       => args.into(),
        };
        tracing::info!("Training for {} epochs at lr={}", config.epochs, config.lr);

        let report = TrainUseCase::new(config).execute()?;

        println!("\nTop losses:");
        for t in &report.top_losses {
            println!(
                "  id:{:<3} loss:{:.4}  true:{:?}  pred:{:?}",
                t.index, t.loss, t.true_classes(), t.predicted_classes(),
            );
        }
        println!(
            "\nValidation: loss={:.4} accuracy={:.4} micro-F1={:.4}",
            report.validation.loss, report.validation.accuracy, report.validation.micro_f1,
        );
        if let Some(best) = report.history.best_epoch() {
            println!("Best epoch: {} (val_loss={:.4})", best.epoch, best.val_loss);
        }
        if let Some(loss) = report.final_val_loss() {
            println!("final_loss:{loss}");
        }
        Ok(())
    }

    fn run_lr_find(args: LrFindArgs) -> Result<()> {
        use crate::application::lr_find_use_case::LrFindUseCase;

        let result = LrFindUseCase::new(args.into()).execute()?;

        println!("{:>12} {:>12}", "lr", "loss");
        for (lr, loss) in result.lrs.iter().zip(result.smoothed.iter()) {
            println!("{lr:>12.3e} {loss:>12.4}");
        }
        match result.suggestion_min_loss() {
            Some(lr) => println!("\nMin-loss suggestion (lr at min / 10): {lr:.2e}"),
            None     => println!("\nSweep recorded no losses"),
        }
        if let Some(lr) = result.suggestion_steepest() {
            println!("Steepest-descent suggestion: {lr:.2e}");
        }
        Ok(())
    }

    fn run_predict(args: PredictArgs) -> Result<()> {
        use crate::application::predict_use_case::{parse_tokens, PredictUseCase};

        let tokens   = parse_tokens(&args.tokens)?;
        let use_case = PredictUseCase::new(args.checkpoint_dir)?;

        for score in use_case.predict(&tokens)? {
            println!(
                "class {}: {:.4}{}",
                score.class,
                score.probability,
                if score.active { "  *" } else { "" },
            );
        }
        Ok(())
    }
}
