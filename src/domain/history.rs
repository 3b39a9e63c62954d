// ============================================================
// Layer 3 — Training History
// ============================================================
// fit() returns a History: one EpochMetrics record per epoch,
// in the order the epochs ran.
//
// Metrics recorded per epoch:
//   - epoch:        the epoch number within this fit() call (1, 2, ...)
//   - lr:           learning rate used for every step of the epoch
//   - train_loss:   mean binary cross-entropy over training batches
//   - val_loss:     mean binary cross-entropy over the validation set
//   - val_accuracy: fraction of (sample, class) cells predicted
//                   correctly at a 0.5 threshold
//
// How to read the metrics:
//   - Loss should decrease each epoch (model is learning)
//   - If val_loss increases while train_loss decreases → overfitting

use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Learning rate used during this epoch
    pub lr: f64,

    /// Average loss over all training batches
    pub train_loss: f64,

    /// Average loss on the validation set
    pub val_loss: f64,

    /// Binary accuracy on the validation set, in [0.0, 1.0]
    pub val_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, lr: f64, train_loss: f64, val_loss: f64, val_accuracy: f64) -> Self {
        Self { epoch, lr, train_loss, val_loss, val_accuracy }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Ordered per-epoch metrics of one fit() call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    epochs: Vec<EpochMetrics>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    /// Validation loss per epoch, in execution order
    pub fn val_loss(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_loss).collect()
    }

    /// Validation loss of the last epoch
    pub fn final_val_loss(&self) -> Option<f64> {
        self.last().map(|m| m.val_loss)
    }

    /// The epoch with the lowest validation loss
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        let mut best: Option<&EpochMetrics> = None;
        for m in &self.epochs {
            match best {
                Some(b) if !m.is_improvement(b.val_loss) => {}
                _ => best = Some(m),
            }
        }
        best
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 1e-3, 2.5, 2.3, 0.5);
        // 2.3 < 3.0 → this is an improvement
        assert!(m.is_improvement(3.0));
        // 2.3 is NOT less than 2.0 → not an improvement
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_series_keep_execution_order() {
        let mut h = History::new();
        h.push(EpochMetrics::new(1, 1e-3, 0.9, 0.8, 0.5));
        h.push(EpochMetrics::new(2, 1e-3, 0.7, 0.6, 0.6));
        h.push(EpochMetrics::new(3, 1e-3, 0.5, 0.65, 0.7));

        assert_eq!(h.val_loss(), vec![0.8, 0.6, 0.65]);
        assert_eq!(h.final_val_loss(), Some(0.65));
        assert_eq!(h.best_epoch().map(|m| m.epoch), Some(2));
    }

    #[test]
    fn test_empty_history() {
        let h = History::new();
        assert!(h.is_empty());
        assert_eq!(h.final_val_loss(), None);
        assert!(h.best_epoch().is_none());
    }
}
