// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a trained model from a checkpoint directory and scores a
// single token sequence.

use anyhow::Result;

use crate::domain::report::DECISION_THRESHOLD;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Predictor;

/// Probability of one class for one input
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScore {
    pub class:       usize,
    pub probability: f32,
    pub active:      bool,
}

pub struct PredictUseCase {
    predictor: Predictor,
}

impl PredictUseCase {
    pub fn new(checkpoint_dir: impl Into<String>) -> Result<Self> {
        let ckpt      = CheckpointManager::open(checkpoint_dir)?;
        let predictor = Predictor::from_checkpoint(&ckpt)?;
        Ok(Self { predictor })
    }

    pub fn predict(&self, tokens: &[u32]) -> Result<Vec<ClassScore>> {
        let probs = self.predictor.predict_tokens(tokens)?;
        Ok(probs
            .into_iter()
            .enumerate()
            .map(|(class, probability)| ClassScore {
                class,
                probability,
                active: probability >= DECISION_THRESHOLD,
            })
            .collect())
    }
}

/// Parse "1,2,3" (spaces allowed) into token ids
pub fn parse_tokens(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|e| anyhow::anyhow!("Invalid token id '{s}': {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_tokens("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_tokens("").unwrap(), Vec::<u32>::new());
        assert!(parse_tokens("1,x").is_err());
    }

    #[test]
    fn test_missing_checkpoint_dir_is_not_created() {
        let dir = std::env::temp_dir().join(format!("mll-predict-missing-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let err = PredictUseCase::new(dir.to_string_lossy().to_string()).err().unwrap();
        assert!(err.to_string().contains("does not exist"));
        assert!(!dir.exists());
    }
}
