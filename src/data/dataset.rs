use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::dataset::MultiLabelDataset;

/// One padded token row with its multi-hot targets.
/// `index` is the row's position in the source dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiLabelSample {
    pub index:     usize,
    pub token_ids: Vec<u32>,
    pub targets:   Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SequenceDataset {
    samples: Vec<MultiLabelSample>,
}

impl From<&MultiLabelDataset> for SequenceDataset {
    fn from(ds: &MultiLabelDataset) -> Self {
        let samples = ds
            .rows()
            .enumerate()
            .map(|(index, (x, y))| MultiLabelSample {
                index,
                token_ids: x.to_vec(),
                targets:   y.to_vec(),
            })
            .collect();
        Self { samples }
    }
}

impl Dataset<MultiLabelSample> for SequenceDataset {
    fn get(&self, index: usize) -> Option<MultiLabelSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_keep_their_index() {
        let ds = MultiLabelDataset::new(
            vec![vec![1, 0], vec![2, 3]],
            vec![vec![1, 0], vec![1, 1]],
        )
        .unwrap();
        let seq = SequenceDataset::from(&ds);

        assert_eq!(seq.len(), 2);
        let second = seq.get(1).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.token_ids, vec![2, 3]);
        assert_eq!(second.targets, vec![1, 1]);
        assert!(seq.get(2).is_none());
    }
}
