// ============================================================
// Layer 5 — Predictor
// ============================================================
use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::MultiLabelBatcher;
use crate::domain::traits::MultiLabelScorer;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::learner::{check_rows, to_f32_vec};
use crate::ml::model::{MultiLabelClassifier, MultiLabelClassifierConfig};
use crate::ml::{default_device, InferBackend};

pub struct Predictor<B: Backend = InferBackend> {
    model:   MultiLabelClassifier<B>,
    max_len: usize,
    device:  B::Device,
}

impl Predictor<InferBackend> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        Self::from_checkpoint_on(ckpt_manager, default_device())
    }
}

impl<B: Backend> Predictor<B> {
    pub fn from_checkpoint_on(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg = ckpt_manager.load_config()?;
        let model_cfg = MultiLabelClassifierConfig::new(cfg.max_features + 1, cfg.num_classes)
            .with_embed_dim(cfg.embed_dim);
        let model: MultiLabelClassifier<B> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");
        Ok(Self { model, max_len: cfg.max_len, device })
    }

    /// Score one token sequence, zero-padded or truncated to the
    /// sequence length the model was trained with.
    pub fn predict_tokens(&self, tokens: &[u32]) -> Result<Vec<f32>> {
        let mut row = tokens.to_vec();
        row.truncate(self.max_len);
        row.resize(self.max_len, 0);

        let mut probs = self.predict(&[row])?;
        Ok(probs.pop().unwrap_or_default())
    }
}

impl<B: Backend> MultiLabelScorer for Predictor<B> {
    fn predict(&self, rows: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        check_rows(rows, self.model.vocab_size)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let tokens = MultiLabelBatcher::<B>::new(self.device.clone()).tokens(rows);
        let probs  = to_f32_vec(self.model.forward_probs(tokens).into_data())?;
        Ok(probs.chunks(self.model.num_classes).map(|c| c.to_vec()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::application::train_use_case::TrainConfig;

    #[test]
    fn test_predictor_from_checkpoint() {
        let _rng = crate::ml::backend_rng_guard();
        let dir = std::env::temp_dir().join(format!("mll-predictor-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let ckpt = CheckpointManager::new(dir.to_string_lossy().to_string()).unwrap();

        let cfg = TrainConfig { embed_dim: 8, ..TrainConfig::default() };
        ckpt.save_config(&cfg).unwrap();
        let device = Default::default();
        let model = MultiLabelClassifierConfig::new(cfg.max_features + 1, cfg.num_classes)
            .with_embed_dim(cfg.embed_dim)
            .init::<NdArray>(&device);
        ckpt.save_model(&model, "final").unwrap();

        let predictor = Predictor::<NdArray>::from_checkpoint_on(&ckpt, device).unwrap();
        // Short input is padded, long input truncated
        let short = predictor.predict_tokens(&[1, 2]).unwrap();
        let long  = predictor.predict_tokens(&[1, 2, 0, 0, 0, 0, 0, 3, 3]).unwrap();
        assert_eq!(short.len(), cfg.num_classes);
        assert_eq!(short, long);

        assert!(predictor.predict_tokens(&[cfg.max_features as u32 + 1]).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
