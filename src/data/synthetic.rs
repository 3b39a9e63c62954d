// ============================================================
// Layer 4 — Synthetic Multi-Label Dataset
// ============================================================
// A fixed, in-memory dataset small enough to memorise:
//
//   20 rows × 7 token ids    (vocabulary 1..=4, 0 = padding)
//   20 rows × 4 label bits   (one column per class)
//
// Each class corresponds to one token: a row carries class k
// whenever it contains token k+1, except that class 3 also
// depends on how much token 2 is present. Some rows have no
// labels at all, some have all four.
//
// Reference: Burn Book §4 (Datasets)

use anyhow::Result;

use crate::domain::dataset::MultiLabelDataset;
use crate::domain::traits::DatasetSource;

/// Padded sequence length of every feature row
pub const MAX_LEN: usize = 7;

/// Highest token id in the vocabulary (0 is padding)
pub const MAX_FEATURES: usize = 4;

/// Number of label columns
pub const NUM_CLASSES: usize = 4;

const FEATURES: [[u32; MAX_LEN]; 20] = [
    [1, 0, 0, 0, 0, 0, 0],
    [1, 2, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0],
    [3, 4, 0, 0, 0, 0, 0],
    [2, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0],
    [4, 0, 0, 0, 0, 0, 0],
    [2, 3, 0, 0, 0, 0, 0],
    [1, 2, 3, 0, 0, 0, 0],
    [1, 2, 3, 4, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0],
    [1, 1, 2, 3, 0, 0, 0],
    [2, 3, 3, 4, 0, 0, 0],
    [4, 4, 1, 1, 2, 0, 0],
    [1, 2, 3, 3, 3, 3, 3],
    [2, 4, 2, 4, 2, 0, 0],
    [1, 3, 3, 3, 0, 0, 0],
    [4, 4, 0, 0, 0, 0, 0],
    [3, 3, 0, 0, 0, 0, 0],
    [1, 1, 4, 0, 0, 0, 0],
];

const LABELS: [[u8; NUM_CLASSES]; 20] = [
    [1, 0, 0, 0],
    [1, 1, 0, 0],
    [0, 0, 1, 0],
    [0, 0, 1, 1],
    [0, 1, 0, 0],
    [0, 0, 1, 0],
    [0, 0, 0, 1],
    [0, 1, 1, 0],
    [1, 1, 1, 0],
    [1, 1, 1, 1],
    [0, 0, 0, 0],
    [1, 1, 1, 0],
    [0, 1, 1, 1],
    [1, 1, 0, 1],
    [1, 1, 1, 0],
    [0, 1, 0, 0],
    [1, 0, 1, 0],
    [0, 0, 0, 1],
    [0, 0, 1, 0],
    [1, 0, 0, 1],
];

/// Build the fixed synthetic (X, Y) pair.
pub fn synthetic_multilabel() -> Result<MultiLabelDataset> {
    let features = FEATURES.iter().map(|row| row.to_vec()).collect();
    let labels   = LABELS.iter().map(|row| row.to_vec()).collect();
    Ok(MultiLabelDataset::new(features, labels)?)
}

/// DatasetSource over the fixed synthetic rows
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticMultilabel;

impl DatasetSource for SyntheticMultilabel {
    fn load(&self) -> Result<MultiLabelDataset> {
        synthetic_multilabel()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::is_multilabel;

    #[test]
    fn test_dimensions() {
        let ds = synthetic_multilabel().unwrap();
        assert_eq!(ds.len(), 20);
        assert_eq!(ds.features().len(), ds.labels().len());
        assert!(ds.features().iter().all(|x| x.len() == 7));
        assert!(ds.labels().iter().all(|y| y.len() == 4));
        assert_eq!(ds.max_token_id() as usize, MAX_FEATURES);
    }

    #[test]
    fn test_is_multilabel() {
        let ds = SyntheticMultilabel.load().unwrap();
        assert!(is_multilabel(ds.features(), ds.labels()).unwrap());
        // Row 1 has two active classes
        assert_eq!(ds.labels()[1].iter().filter(|&&v| v == 1).count(), 2);
    }
}
