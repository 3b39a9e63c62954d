// ============================================================
// Layer 3 — Validation and Top-Loss Results
// ============================================================
// validate() produces a ValidationReport: mean loss, binary
// accuracy, and precision / recall / F1 for every class plus a
// micro average over all (sample, class) cells.
//
// view_top_losses() produces TopLoss records: the validation rows
// the model gets most wrong, highest loss first.

use serde::{Deserialize, Serialize};

/// Threshold above which a sigmoid output counts as a positive
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Confusion counts for a single class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub true_positives:  usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives:  usize,
}

impl ClassCounts {
    /// Record one (truth, prediction) cell
    pub fn record(&mut self, truth: bool, predicted: bool) {
        match (truth, predicted) {
            (true, true)   => self.true_positives  += 1,
            (false, true)  => self.false_positives += 1,
            (true, false)  => self.false_negatives += 1,
            (false, false) => self.true_negatives  += 1,
        }
    }

    pub fn merge(&mut self, other: &ClassCounts) {
        self.true_positives  += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.true_negatives  += other.true_negatives;
    }

    /// Number of rows where the class is truly active
    pub fn support(&self) -> usize {
        self.true_positives + self.false_negatives
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

// 0/0 is reported as 0.0, as sklearn does with zero_division=0
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Per-class line of the validation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub class:     usize,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

/// Aggregate metrics over the validation set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub num_samples:     usize,
    pub loss:            f64,
    pub accuracy:        f64,
    pub classes:         Vec<ClassReport>,
    pub micro_precision: f64,
    pub micro_recall:    f64,
    pub micro_f1:        f64,
}

impl ValidationReport {
    /// Build a report from the mean loss and per-class confusion counts.
    pub fn from_counts(num_samples: usize, loss: f64, counts: &[ClassCounts]) -> Self {
        let mut total = ClassCounts::default();
        for c in counts {
            total.merge(c);
        }

        let cells   = total.true_positives + total.false_positives
                    + total.false_negatives + total.true_negatives;
        let correct = total.true_positives + total.true_negatives;

        let classes = counts
            .iter()
            .enumerate()
            .map(|(class, c)| ClassReport {
                class,
                precision: c.precision(),
                recall:    c.recall(),
                f1:        c.f1(),
                support:   c.support(),
            })
            .collect();

        Self {
            num_samples,
            loss,
            accuracy:        ratio(correct, cells),
            classes,
            micro_precision: total.precision(),
            micro_recall:    total.recall(),
            micro_f1:        total.f1(),
        }
    }
}

/// One validation row with its loss, for misclassification review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLoss {
    /// Row index in the validation dataset
    pub index:     usize,
    pub loss:      f64,
    pub truth:     Vec<u8>,
    pub predicted: Vec<f32>,
}

impl TopLoss {
    /// Classes whose predicted probability crosses the threshold
    pub fn predicted_classes(&self) -> Vec<usize> {
        self.predicted
            .iter()
            .enumerate()
            .filter(|(_, &p)| p >= DECISION_THRESHOLD)
            .map(|(i, _)| i)
            .collect()
    }

    /// Classes active in the ground truth
    pub fn true_classes(&self) -> Vec<usize> {
        self.truth
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == 1)
            .map(|(i, _)| i)
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts_metrics() {
        let mut c = ClassCounts::default();
        c.record(true, true);
        c.record(true, true);
        c.record(false, true);
        c.record(true, false);
        c.record(false, false);

        assert_eq!(c.support(), 3);
        assert!((c.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((c.recall() - 2.0 / 3.0).abs() < 1e-12);
        assert!((c.f1() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_predictions_gives_zero_precision() {
        let mut c = ClassCounts::default();
        c.record(true, false);
        assert_eq!(c.precision(), 0.0);
        assert_eq!(c.f1(), 0.0);
    }

    #[test]
    fn test_report_accuracy_counts_cells() {
        let mut a = ClassCounts::default();
        a.record(true, true);
        a.record(false, false);
        let mut b = ClassCounts::default();
        b.record(true, false);
        b.record(false, false);

        let report = ValidationReport::from_counts(2, 0.3, &[a, b]);
        // 3 of 4 cells correct
        assert!((report.accuracy - 0.75).abs() < 1e-12);
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.classes[1].support, 1);
        assert_eq!(report.micro_precision, 1.0);
        assert!((report.micro_recall - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_top_loss_class_lists() {
        let t = TopLoss {
            index:     3,
            loss:      1.2,
            truth:     vec![1, 0, 1],
            predicted: vec![0.9, 0.6, 0.1],
        };
        assert_eq!(t.true_classes(), vec![0, 2]);
        assert_eq!(t.predicted_classes(), vec![0, 1]);
    }
}
