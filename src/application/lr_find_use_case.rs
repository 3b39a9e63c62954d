// ============================================================
// Layer 2 — LrFindUseCase
// ============================================================
// Runs only the learning-rate sweep: load the data, build the
// model and learner exactly as TrainUseCase does, sweep, report.

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;

use crate::application::train_use_case::TrainConfig;
use crate::data::synthetic::SyntheticMultilabel;
use crate::domain::traits::DatasetSource;
use crate::ml::{
    default_device,
    learner::get_learner,
    lr_finder::LrFinderResult,
    TrainBackend,
};

pub struct LrFindUseCase {
    config: TrainConfig,
}

impl LrFindUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<LrFinderResult> {
        self.execute_on::<TrainBackend>(default_device())
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<LrFinderResult> {
        let cfg = &self.config;
        let dataset = SyntheticMultilabel.load()?;

        B::seed(cfg.seed);
        let model = cfg.model_config().init::<B>(&device);
        let learner = get_learner(model, dataset.clone(), dataset, cfg.batch_size, device)?
            .with_seed(cfg.seed);

        learner.lr_find(cfg.lr_find_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_sweep_produces_curve() {
        let _rng = crate::ml::backend_rng_guard();
        let cfg = TrainConfig { embed_dim: 8, batch_size: 2, lr_find_iters: 40, ..TrainConfig::default() };
        let result = LrFindUseCase::new(cfg)
            .execute_on::<Autodiff<NdArray>>(Default::default())
            .unwrap();

        assert!(!result.is_empty());
        assert!(result.lrs.len() <= 40);
        assert_eq!(result.lrs.len(), result.losses.len());
        assert_eq!(result.lrs.len(), result.smoothed.len());
    }
}
