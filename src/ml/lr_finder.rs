// ============================================================
// Layer 5 — Learning-Rate Sweep
// ============================================================
// The bookkeeping half of Learner::lr_find(): which learning rate
// to use at step i, how to smooth the noisy per-batch losses, when
// to stop, and how to read a suggestion off the resulting curve.
// The training half lives in learner.rs.
//
//   lr_i     = start_lr · (end_lr / start_lr) ^ (i / (num_iter - 1))
//   avg_i    = β·avg_{i-1} + (1-β)·loss_i
//   smooth_i = avg_i / (1 - β^(i+1))          (bias correction)
//
// The sweep stops once smooth_i > stop_factor · best smoothed loss.
//
// Reference: Smith (2017) Cyclical Learning Rates for Training
//            Neural Networks, §3.3

use serde::{Deserialize, Serialize};

/// Losses skipped at the start of the curve when looking for the
/// steepest descent (the first steps are mostly noise)
const SKIP_BEGIN: usize = 10;
/// Losses skipped at the end (where the loss is already exploding)
const SKIP_END: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrFindConfig {
    pub start_lr:    f64,
    pub end_lr:      f64,
    /// Maximum number of mini-batches in the sweep
    pub num_iter:    usize,
    pub stop_factor: f64,
    /// Exponential smoothing factor for the loss curve
    pub beta:        f64,
}

impl Default for LrFindConfig {
    fn default() -> Self {
        Self {
            start_lr:    1e-7,
            end_lr:      10.0,
            num_iter:    100,
            stop_factor: 4.0,
            beta:        0.98,
        }
    }
}

impl LrFindConfig {
    pub fn with_num_iter(mut self, num_iter: usize) -> Self {
        self.num_iter = num_iter;
        self
    }

    /// Learning rate for sweep step `step` (0-based)
    pub fn lr_at(&self, step: usize) -> f64 {
        if self.num_iter <= 1 {
            return self.start_lr;
        }
        let t = step as f64 / (self.num_iter - 1) as f64;
        self.start_lr * (self.end_lr / self.start_lr).powf(t)
    }
}

/// Outcome of recording one sweep step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStep {
    Continue,
    /// The smoothed loss diverged (or became non-finite)
    Stop,
}

/// Accumulates (lr, loss) points while the sweep runs.
#[derive(Debug, Clone)]
pub struct LrSweep {
    config:   LrFindConfig,
    avg_loss: f64,
    best:     f64,
    lrs:      Vec<f64>,
    losses:   Vec<f64>,
    smoothed: Vec<f64>,
}

impl LrSweep {
    pub fn new(config: LrFindConfig) -> Self {
        Self {
            config,
            avg_loss: 0.0,
            best:     f64::INFINITY,
            lrs:      Vec::new(),
            losses:   Vec::new(),
            smoothed: Vec::new(),
        }
    }

    /// Number of points recorded so far
    pub fn steps(&self) -> usize {
        self.lrs.len()
    }

    pub fn is_done(&self) -> bool {
        self.steps() >= self.config.num_iter
    }

    /// Learning rate for the next step
    pub fn next_lr(&self) -> f64 {
        self.config.lr_at(self.steps())
    }

    /// Record the raw loss measured at `lr`.
    pub fn record(&mut self, lr: f64, loss: f64) -> SweepStep {
        if !loss.is_finite() {
            return SweepStep::Stop;
        }

        let beta = self.config.beta;
        let step = self.steps();
        self.avg_loss = beta * self.avg_loss + (1.0 - beta) * loss;
        let smoothed  = self.avg_loss / (1.0 - beta.powi(step as i32 + 1));

        self.lrs.push(lr);
        self.losses.push(loss);
        self.smoothed.push(smoothed);

        if step > 0 && smoothed > self.config.stop_factor * self.best {
            return SweepStep::Stop;
        }
        if smoothed < self.best {
            self.best = smoothed;
        }
        SweepStep::Continue
    }

    pub fn finish(self) -> LrFinderResult {
        LrFinderResult {
            lrs:      self.lrs,
            losses:   self.losses,
            smoothed: self.smoothed,
        }
    }
}

/// The learning-rate / loss curve produced by a sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LrFinderResult {
    pub lrs:      Vec<f64>,
    pub losses:   Vec<f64>,
    pub smoothed: Vec<f64>,
}

impl LrFinderResult {
    pub fn is_empty(&self) -> bool {
        self.lrs.is_empty()
    }

    /// Learning rate where the smoothed loss falls fastest.
    pub fn suggestion_steepest(&self) -> Option<f64> {
        let n = self.smoothed.len();
        if n < 3 {
            return None;
        }
        // Trim the noisy head and the exploding tail when the curve is long enough
        let (begin, end) = if n > SKIP_BEGIN + SKIP_END + 2 {
            (SKIP_BEGIN, n - SKIP_END)
        } else {
            (0, n)
        };

        let window = &self.smoothed[begin..end];
        let slopes = gradient(window);
        let steepest = slopes
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)?;

        Some(self.lrs[begin + steepest])
    }

    /// One tenth of the learning rate at the minimum smoothed loss.
    pub fn suggestion_min_loss(&self) -> Option<f64> {
        self.smoothed
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.lrs[i] / 10.0)
    }
}

// Central differences inside, one-sided differences at the ends
fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    (0..n)
        .map(|i| match i {
            0 => values[1] - values[0],
            i if i == n - 1 => values[n - 1] - values[n - 2],
            i => (values[i + 1] - values[i - 1]) / 2.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_endpoints() {
        let cfg = LrFindConfig::default();
        assert!((cfg.lr_at(0) - 1e-7).abs() < 1e-15);
        assert!((cfg.lr_at(99) - 10.0).abs() < 1e-9);
        assert!(cfg.lr_at(50) > cfg.lr_at(49));
    }

    #[test]
    fn test_sweep_stops_on_divergence() {
        let mut sweep = LrSweep::new(LrFindConfig::default().with_num_iter(50));
        for i in 0..20 {
            assert_eq!(sweep.record(sweep.next_lr(), 1.0 - i as f64 * 0.01), SweepStep::Continue);
        }
        // One enormous loss pushes the smoothed curve past 4x the best
        assert_eq!(sweep.record(sweep.next_lr(), 1e6), SweepStep::Stop);
        assert_eq!(sweep.steps(), 21);
    }

    #[test]
    fn test_sweep_stops_on_nan() {
        let mut sweep = LrSweep::new(LrFindConfig::default());
        assert_eq!(sweep.record(1e-7, f64::NAN), SweepStep::Stop);
        assert_eq!(sweep.steps(), 0);
    }

    #[test]
    fn test_sweep_done_after_num_iter() {
        let mut sweep = LrSweep::new(LrFindConfig::default().with_num_iter(3));
        for _ in 0..3 {
            sweep.record(sweep.next_lr(), 0.5);
        }
        assert!(sweep.is_done());
        let result = sweep.finish();
        assert_eq!(result.lrs.len(), 3);
        assert!(result.lrs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_suggestions() {
        // Flat, then a sharp drop around step 30, then a rise
        let lrs: Vec<f64> = (0..60).map(|i| 1e-5 * 1.2f64.powi(i)).collect();
        let smoothed: Vec<f64> = (0..60)
            .map(|i| match i {
                0..=25  => 1.0,
                26..=35 => 1.0 - (i - 25) as f64 * 0.08,
                _       => 0.2 + (i - 35) as f64 * 0.01,
            })
            .collect();
        let result = LrFinderResult { lrs: lrs.clone(), losses: smoothed.clone(), smoothed };

        let steepest = result.suggestion_steepest().unwrap();
        let idx = lrs.iter().position(|&lr| lr == steepest).unwrap();
        assert!((26..=35).contains(&idx));

        let min_loss = result.suggestion_min_loss().unwrap();
        assert!((min_loss - lrs[35] / 10.0).abs() < 1e-15);
    }

    #[test]
    fn test_short_curve_has_no_steepest() {
        let result = LrFinderResult {
            lrs:      vec![1e-3, 1e-2],
            losses:   vec![1.0, 0.9],
            smoothed: vec![1.0, 0.9],
        };
        assert!(result.suggestion_steepest().is_none());
        assert!(result.suggestion_min_loss().is_some());
    }
}
