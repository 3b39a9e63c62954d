// ============================================================
// Layer 4 — Multi-Label Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a
// Vec<MultiLabelSample> into tensors.
//
// How batching works here:
//   Input:  Vec of N samples, each with S token ids and C targets
//   Output: MultiLabelBatch with token_ids [N, S], targets [N, C]
//
//   We flatten all token ids into one long Vec, then reshape:
//   [s1_t1, s1_t2, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// Every row is already padded to the same length by
// MultiLabelDataset, so no dynamic padding is needed here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::MultiLabelSample;

/// A batch of samples ready for the model forward pass.
/// All tensors have batch_size as their first dimension.
#[derive(Debug, Clone)]
pub struct MultiLabelBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub token_ids: Tensor<B, 2, Int>,

    /// Multi-hot targets — shape: [batch_size, num_classes]
    pub targets: Tensor<B, 2, Int>,

    /// Source row index of each sample, in batch order
    pub indices: Vec<usize>,
}

/// Holds the target device so tensors are created where the
/// model lives.
#[derive(Clone, Debug)]
pub struct MultiLabelBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> MultiLabelBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Build a [rows, seq_len] token tensor from raw rows.
    /// Used for inference, where there are no targets.
    pub fn tokens(&self, rows: &[Vec<u32>]) -> Tensor<B, 2, Int> {
        let seq_len = rows.first().map(|r| r.len()).unwrap_or(0);
        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|r| r.iter().map(|&t| t as i32))
            .collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([rows.len(), seq_len])
    }
}

impl<B: Backend> Batcher<MultiLabelSample, MultiLabelBatch<B>> for MultiLabelBatcher<B> {
    fn batch(&self, items: Vec<MultiLabelSample>) -> MultiLabelBatch<B> {
        let batch_size  = items.len();
        let seq_len     = items[0].token_ids.len();
        let num_classes = items[0].targets.len();

        // Burn uses i32 for Int tensors
        let token_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.token_ids.iter().map(|&t| t as i32))
            .collect();

        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.targets.iter().map(|&t| t as i32))
            .collect();

        let token_ids = Tensor::<B, 1, Int>::from_ints(token_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), &self.device)
            .reshape([batch_size, num_classes]);

        let indices = items.iter().map(|s| s.index).collect();

        MultiLabelBatch { token_ids, targets, indices }
    }
}
