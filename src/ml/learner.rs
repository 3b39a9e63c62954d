// ============================================================
// Layer 5 — Learner
// ============================================================
// Binds one model to one training set and one validation set
// and exposes the training workflow as explicit method calls:
//
//   get_learner(...)      → constructed
//   learner.lr_find(..)   → learning-rate sweep (optional, weights restored)
//   learner.fit(lr, n)    → n epochs at a constant lr, returns History
//   learner.view_top_losses(k)
//   learner.validate()    → ValidationReport (read-only)
//
// Training runs on an AutodiffBackend; validation and prediction
// run on model.valid(), the same weights on the inner backend
// with no autodiff graph.
//
// Reference: Burn Book §5 (Training), Kingma & Ba (2015) Adam

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, TensorData},
};
use thiserror::Error;

use crate::data::{
    batcher::MultiLabelBatcher,
    dataset::SequenceDataset,
};
use crate::domain::{
    dataset::MultiLabelDataset,
    history::{EpochMetrics, History},
    report::{ClassCounts, TopLoss, ValidationReport, DECISION_THRESHOLD},
    traits::MultiLabelScorer,
};
use crate::infra::metrics::MetricsLogger;
use crate::ml::lr_finder::{LrFindConfig, LrFinderResult, LrSweep, SweepStep};
use crate::ml::model::{per_sample_loss, MultiLabelClassifier};

/// Seed used for shuffling unless overridden with `with_seed`
pub const DEFAULT_SEED: u64 = 42;

/// Problems detected when binding a model to its data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LearnerError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("{split} data contains token id {token}, but the model vocabulary has {vocab_size} ids")]
    TokenOutOfVocabulary { split: &'static str, token: u32, vocab_size: usize },

    #[error("{split} data has {found} label columns, but the model predicts {expected} classes")]
    ClassCountMismatch { split: &'static str, expected: usize, found: usize },

    #[error("input rows must all have the same width (row {row} has {found}, expected {expected})")]
    RaggedInput { row: usize, expected: usize, found: usize },
}

/// Per-row output of one pass over the validation set
struct ScoredRow {
    index: usize,
    loss:  f64,
    probs: Vec<f32>,
}

pub struct Learner<B: AutodiffBackend> {
    model:        MultiLabelClassifier<B>,
    optim:        OptimizerAdaptor<Adam, MultiLabelClassifier<B>, B>,
    optim_config: AdamConfig,
    train_data:   MultiLabelDataset,
    val_data:     MultiLabelDataset,
    batch_size:   usize,
    seed:         u64,
    // Number of fit() calls so far; varies the shuffle seed between calls
    fits:         u64,
    device:       B::Device,
    history:      History,
    metrics:      Option<MetricsLogger>,
}

/// Bind `model` to its training and validation data.
///
/// The model is trained with Adam (default settings) and binary
/// cross-entropy. Fails if the data cannot be fed to the model.
pub fn get_learner<B: AutodiffBackend>(
    model:      MultiLabelClassifier<B>,
    train_data: MultiLabelDataset,
    val_data:   MultiLabelDataset,
    batch_size: usize,
    device:     B::Device,
) -> Result<Learner<B>, LearnerError> {
    if batch_size == 0 {
        return Err(LearnerError::ZeroBatchSize);
    }
    check_fits_model(&model, &train_data, "train")?;
    check_fits_model(&model, &val_data, "validation")?;

    let optim_config = AdamConfig::new().with_epsilon(1e-7);
    let optim = optim_config.init();

    tracing::info!(
        "Learner ready: {} train rows, {} validation rows, batch_size={}",
        train_data.len(), val_data.len(), batch_size,
    );

    Ok(Learner {
        model,
        optim,
        optim_config,
        train_data,
        val_data,
        batch_size,
        seed: DEFAULT_SEED,
        fits: 0,
        device,
        history: History::new(),
        metrics: None,
    })
}

fn check_fits_model<B: Backend>(
    model: &MultiLabelClassifier<B>,
    data:  &MultiLabelDataset,
    split: &'static str,
) -> Result<(), LearnerError> {
    let token = data.max_token_id();
    if token as usize >= model.vocab_size {
        return Err(LearnerError::TokenOutOfVocabulary { split, token, vocab_size: model.vocab_size });
    }
    if data.num_classes() != model.num_classes {
        return Err(LearnerError::ClassCountMismatch {
            split,
            expected: model.num_classes,
            found:    data.num_classes(),
        });
    }
    Ok(())
}

impl<B: AutodiffBackend> Learner<B> {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Append every epoch of every fit() to a CSV file
    pub fn with_metrics_logger(mut self, logger: MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    pub fn model(&self) -> &MultiLabelClassifier<B> {
        &self.model
    }

    /// History of the most recent fit() call
    pub fn history(&self) -> &History {
        &self.history
    }

    // ── Learning-rate sweep ─────────────────────────────────────────────────

    /// Train briefly with an exponentially increasing learning rate
    /// and record the loss at each step.
    ///
    /// The sweep trains a copy of the model with its own optimizer,
    /// so the learner's weights and optimizer state are unchanged
    /// afterwards.
    pub fn lr_find(&self, config: LrFindConfig) -> Result<LrFinderResult> {
        let mut model = self.model.clone();
        let mut optim: OptimizerAdaptor<Adam, MultiLabelClassifier<B>, B> = self.optim_config.init();
        let mut sweep = LrSweep::new(config);

        let loader = DataLoaderBuilder::new(MultiLabelBatcher::<B>::new(self.device.clone()))
            .batch_size(self.batch_size)
            .shuffle(self.seed)
            .build(SequenceDataset::from(&self.train_data));

        tracing::info!("Simulating training for different learning rates...");

        'sweep: while !sweep.is_done() {
            for batch in loader.iter() {
                if sweep.is_done() {
                    break 'sweep;
                }
                let lr = sweep.next_lr();
                let (loss, _) = model.forward_loss(batch.token_ids, batch.targets);
                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

                if sweep.record(lr, loss_val) == SweepStep::Stop {
                    tracing::info!("Loss diverged at lr={:.3e}, stopping sweep", lr);
                    break 'sweep;
                }

                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(lr, model, grads);
            }
        }

        let result = sweep.finish();
        match (result.suggestion_min_loss(), result.suggestion_steepest()) {
            (Some(min_loss), Some(steepest)) => tracing::info!(
                "LR sweep done ({} steps): min-loss suggestion {:.2e}, steepest-descent suggestion {:.2e}",
                result.lrs.len(), min_loss, steepest,
            ),
            _ => tracing::info!("LR sweep done ({} steps), too short for a suggestion", result.lrs.len()),
        }
        Ok(result)
    }

    // ── Training ────────────────────────────────────────────────────────────

    /// Train for `epochs` epochs at a constant learning rate.
    ///
    /// Continues from the current weights and optimizer state, so
    /// repeated calls train cumulatively. Validates after every epoch.
    pub fn fit(&mut self, lr: f64, epochs: usize) -> Result<History> {
        let train_loader = DataLoaderBuilder::new(MultiLabelBatcher::<B>::new(self.device.clone()))
            .batch_size(self.batch_size)
            .shuffle(self.seed.wrapping_add(self.fits))
            .build(SequenceDataset::from(&self.train_data));
        self.fits += 1;

        let mut history = History::new();

        for epoch in 1..=epochs {
            // ── Training phase ──────────────────────────────────────────────
            let mut train_loss_sum = 0.0f64;
            let mut train_rows     = 0usize;

            for batch in train_loader.iter() {
                let rows = batch.indices.len();
                let (loss, _) = self.model.forward_loss(batch.token_ids, batch.targets);

                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                train_loss_sum += loss_val * rows as f64;
                train_rows     += rows;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &self.model);
                self.model = self.optim.step(lr, self.model.clone(), grads);
            }

            let train_loss = if train_rows > 0 {
                train_loss_sum / train_rows as f64
            } else { f64::NAN };

            // ── Validation phase ────────────────────────────────────────────
            let scored   = self.score_validation()?;
            let val_loss = mean_loss(&scored);
            let val_acc  = binary_accuracy(&scored, &self.val_data);

            let metrics = EpochMetrics::new(epoch, lr, train_loss, val_loss, val_acc);
            tracing::info!(
                "Epoch {:>3}/{} | loss={:.4} | val_loss={:.4} | val_accuracy={:.4}",
                epoch, epochs, train_loss, val_loss, val_acc,
            );
            if let Some(logger) = &self.metrics {
                logger.log(&metrics)?;
            }
            history.push(metrics);
        }

        self.history = history.clone();
        Ok(history)
    }

    // ── Inspection ──────────────────────────────────────────────────────────

    /// The `n` validation rows with the highest loss, highest first.
    pub fn view_top_losses(&self, n: usize) -> Result<Vec<TopLoss>> {
        let mut scored = self.score_validation()?;
        scored.sort_by(|a, b| b.loss.total_cmp(&a.loss));
        scored.truncate(n);

        let labels = self.val_data.labels();
        let top: Vec<TopLoss> = scored
            .into_iter()
            .map(|row| TopLoss {
                index:     row.index,
                loss:      row.loss,
                truth:     labels[row.index].clone(),
                predicted: row.probs,
            })
            .collect();

        for t in &top {
            tracing::info!(
                "id:{} | loss:{:.4} | true:{:?} | pred:{:?}",
                t.index, t.loss, t.true_classes(), t.predicted_classes(),
            );
        }
        Ok(top)
    }

    /// Loss, binary accuracy and per-class precision/recall/F1 on the
    /// validation set.
    pub fn validate(&self) -> Result<ValidationReport> {
        let scored = self.score_validation()?;
        let num_classes = self.val_data.num_classes();
        let mut counts = vec![ClassCounts::default(); num_classes];

        for row in &scored {
            let truth = &self.val_data.labels()[row.index];
            for (class, c) in counts.iter_mut().enumerate() {
                c.record(truth[class] == 1, row.probs[class] >= DECISION_THRESHOLD);
            }
        }

        let report = ValidationReport::from_counts(scored.len(), mean_loss(&scored), &counts);

        tracing::info!("{:>8} {:>9} {:>9} {:>9} {:>9}", "class", "precision", "recall", "f1", "support");
        for c in &report.classes {
            tracing::info!(
                "{:>8} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.class, c.precision, c.recall, c.f1, c.support,
            );
        }
        tracing::info!(
            "loss={:.4} | accuracy={:.4} | micro precision={:.2} recall={:.2} f1={:.2}",
            report.loss, report.accuracy,
            report.micro_precision, report.micro_recall, report.micro_f1,
        );
        Ok(report)
    }

    // Run the validation set through model.valid() in order
    fn score_validation(&self) -> Result<Vec<ScoredRow>> {
        let model = self.model.valid();
        let loader = DataLoaderBuilder::new(MultiLabelBatcher::<B::InnerBackend>::new(self.device.clone()))
            .batch_size(self.batch_size)
            .build(SequenceDataset::from(&self.val_data));

        let num_classes = self.val_data.num_classes();
        let mut scored = Vec::with_capacity(self.val_data.len());

        for batch in loader.iter() {
            let logits = model.forward(batch.token_ids);
            let losses = per_sample_loss(logits.clone(), batch.targets);
            let probs  = burn::tensor::activation::sigmoid(logits);

            let losses = to_f32_vec(losses.into_data())?;
            let probs  = to_f32_vec(probs.into_data())?;

            for (j, &index) in batch.indices.iter().enumerate() {
                scored.push(ScoredRow {
                    index,
                    loss:  losses[j] as f64,
                    probs: probs[j * num_classes..(j + 1) * num_classes].to_vec(),
                });
            }
        }
        Ok(scored)
    }
}

impl<B: AutodiffBackend> MultiLabelScorer for Learner<B> {
    fn predict(&self, rows: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        check_rows(rows, self.model.vocab_size)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let model  = self.model.valid();
        let tokens = MultiLabelBatcher::<B::InnerBackend>::new(self.device.clone()).tokens(rows);
        let probs  = to_f32_vec(model.forward_probs(tokens).into_data())?;

        Ok(probs.chunks(self.model.num_classes).map(|c| c.to_vec()).collect())
    }
}

/// Reject ragged rows and token ids the embedding cannot look up.
pub fn check_rows(rows: &[Vec<u32>], vocab_size: usize) -> Result<(), LearnerError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for (row, r) in rows.iter().enumerate() {
        if r.len() != first.len() {
            return Err(LearnerError::RaggedInput { row, expected: first.len(), found: r.len() });
        }
        if let Some(&token) = r.iter().find(|&&t| t as usize >= vocab_size) {
            return Err(LearnerError::TokenOutOfVocabulary { split: "input", token, vocab_size });
        }
    }
    Ok(())
}

pub(crate) fn to_f32_vec(data: TensorData) -> Result<Vec<f32>> {
    data.convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

fn mean_loss(scored: &[ScoredRow]) -> f64 {
    if scored.is_empty() {
        return f64::NAN;
    }
    scored.iter().map(|r| r.loss).sum::<f64>() / scored.len() as f64
}

fn binary_accuracy(scored: &[ScoredRow], data: &MultiLabelDataset) -> f64 {
    let mut correct = 0usize;
    let mut cells   = 0usize;
    for row in scored {
        for (p, &t) in row.probs.iter().zip(data.labels()[row.index].iter()) {
            correct += usize::from((*p >= DECISION_THRESHOLD) == (t == 1));
            cells   += 1;
        }
    }
    if cells == 0 { 0.0 } else { correct as f64 / cells as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::synthetic::{synthetic_multilabel, MAX_FEATURES, NUM_CLASSES};
    use crate::ml::backend_rng_guard;
    use crate::ml::model::MultiLabelClassifierConfig;

    type TestBackend = Autodiff<NdArray>;

    fn learner(batch_size: usize) -> Learner<TestBackend> {
        let device = Default::default();
        let ds = synthetic_multilabel().unwrap();
        let model = {
            let _rng = backend_rng_guard();
            TestBackend::seed(7);
            MultiLabelClassifierConfig::new(MAX_FEATURES + 1, NUM_CLASSES)
                .with_embed_dim(16)
                .init::<TestBackend>(&device)
        };
        get_learner(model, ds.clone(), ds, batch_size, device).unwrap()
    }

    fn head_weights(l: &Learner<TestBackend>) -> Vec<f32> {
        to_f32_vec(l.model().head.weight.val().into_data()).unwrap()
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let _rng = backend_rng_guard();
        let device = Default::default();
        let ds = synthetic_multilabel().unwrap();
        let model = MultiLabelClassifierConfig::new(5, 4).init::<TestBackend>(&device);
        let err = get_learner(model, ds.clone(), ds, 0, device).err().unwrap();
        assert_eq!(err, LearnerError::ZeroBatchSize);
    }

    #[test]
    fn test_rejects_tokens_outside_vocabulary() {
        let _rng = backend_rng_guard();
        let device = Default::default();
        let ds = synthetic_multilabel().unwrap();
        // Token 4 needs a vocabulary of at least 5
        let model = MultiLabelClassifierConfig::new(4, 4).init::<TestBackend>(&device);
        let err = get_learner(model, ds.clone(), ds, 1, device).err().unwrap();
        assert_eq!(err, LearnerError::TokenOutOfVocabulary { split: "train", token: 4, vocab_size: 4 });
    }

    #[test]
    fn test_rejects_class_count_mismatch() {
        let _rng = backend_rng_guard();
        let device = Default::default();
        let ds = synthetic_multilabel().unwrap();
        let model = MultiLabelClassifierConfig::new(5, 3).init::<TestBackend>(&device);
        let err = get_learner(model, ds.clone(), ds, 1, device).err().unwrap();
        assert_eq!(err, LearnerError::ClassCountMismatch { split: "train", expected: 3, found: 4 });
    }

    #[test]
    fn test_fit_returns_history_in_order() {
        let mut l = learner(4);
        let history = l.fit(0.01, 3).unwrap();

        assert_eq!(history.len(), 3);
        let epochs: Vec<usize> = history.epochs().iter().map(|m| m.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3]);
        assert!(history.val_loss().iter().all(|v| v.is_finite()));
        assert_eq!(l.history(), &history);
    }

    #[test]
    fn test_fit_is_cumulative() {
        let mut l = learner(4);
        let first  = l.fit(0.05, 5).unwrap();
        let second = l.fit(0.05, 5).unwrap();
        assert!(second.final_val_loss().unwrap() < first.val_loss()[0]);
    }

    #[test]
    fn test_lr_find_restores_weights() {
        let l = learner(2);
        let before = head_weights(&l);

        let result = l.lr_find(LrFindConfig::default().with_num_iter(30)).unwrap();

        assert_eq!(head_weights(&l), before);
        assert!(!result.is_empty());
        assert!((result.lrs[0] - 1e-7).abs() < 1e-15);
        assert!(result.lrs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_validate_is_read_only() {
        let mut l = learner(4);
        l.fit(0.01, 2).unwrap();

        let before = head_weights(&l);
        let first  = l.validate().unwrap();
        let second = l.validate().unwrap();

        assert_eq!(head_weights(&l), before);
        assert_eq!(first, second);
        assert_eq!(first.num_samples, 20);
        assert_eq!(first.classes.len(), NUM_CLASSES);
    }

    #[test]
    fn test_top_losses_sorted_and_bounded() {
        let l = learner(3);
        let top = l.view_top_losses(5).unwrap();

        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].loss >= w[1].loss));

        // Asking for more rows than exist returns every row once
        let all = l.view_top_losses(100).unwrap();
        assert_eq!(all.len(), 20);
        let mut ids: Vec<usize> = all.iter().map(|t| t.index).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_predict_shapes_and_checks() {
        let l = learner(1);
        let probs = l.predict(&[vec![1, 2, 0], vec![4, 0, 0]]).unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|p| p.len() == NUM_CLASSES));

        assert!(l.predict(&[vec![9]]).is_err());
        assert!(l.predict(&[vec![1, 2], vec![1]]).is_err());
        assert!(l.predict(&[]).unwrap().is_empty());
    }
}
