use burn::{
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        Embedding, EmbeddingConfig,
        Initializer,
        Linear, LinearConfig,
    },
    prelude::*,
};

/// Embedding weights start uniform in [-EMBED_INIT_RANGE, EMBED_INIT_RANGE]
pub const EMBED_INIT_RANGE: f64 = 0.05;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct MultiLabelClassifierConfig {
    /// Number of distinct token ids, padding (0) included
    pub vocab_size:  usize,
    pub num_classes: usize,
    #[config(default = 50)]
    pub embed_dim:   usize,
}

impl MultiLabelClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MultiLabelClassifier<B> {
        let embedding = EmbeddingConfig::new(self.vocab_size, self.embed_dim)
            .with_initializer(Initializer::Uniform { min: -EMBED_INIT_RANGE, max: EMBED_INIT_RANGE })
            .init(device);
        let head = LinearConfig::new(self.embed_dim, self.num_classes)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);
        MultiLabelClassifier {
            embedding, head,
            vocab_size:  self.vocab_size,
            num_classes: self.num_classes,
        }
    }
}

/// Embedding → mean over the sequence → linear head.
/// The head produces one independent logit per class; sigmoid
/// turns each into a probability.
#[derive(Module, Debug)]
pub struct MultiLabelClassifier<B: Backend> {
    pub embedding:   Embedding<B>,
    pub head:        Linear<B>,
    pub vocab_size:  usize,
    pub num_classes: usize,
}

impl<B: Backend> MultiLabelClassifier<B> {
    /// token_ids: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, _seq_len] = token_ids.dims();

        let emb = self.embedding.forward(token_ids); // [batch, seq_len, embed_dim]
        let [_, _, embed_dim] = emb.dims();

        // Global average pool; padding positions count like any other token
        let pooled = emb.mean_dim(1).reshape([batch_size, embed_dim]);

        self.head.forward(pooled)
    }

    /// token_ids: [batch, seq_len] → probabilities: [batch, num_classes]
    pub fn forward_probs(&self, token_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        burn::tensor::activation::sigmoid(self.forward(token_ids))
    }

    /// Mean binary cross-entropy over every (sample, class) cell.
    pub fn forward_loss(
        &self,
        token_ids: Tensor<B, 2, Int>,
        targets:   Tensor<B, 2, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(token_ids);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let loss = bce.forward(logits.clone(), targets);
        (loss, logits)
    }
}

/// Binary cross-entropy of each row, averaged over its classes.
///
/// logits, targets: [batch, num_classes] → [batch]
///
/// Uses max(x, 0) - x·t + ln(1 + e^-|x|), which never takes the
/// log of a saturated sigmoid.
pub fn per_sample_loss<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch_size, _] = logits.dims();
    let targets = targets.float();

    let loss = logits.clone().clamp_min(0.0)
        - logits.clone() * targets
        + logits.abs().neg().exp().add_scalar(1.0).log();

    loss.mean_dim(1).reshape([batch_size])
}
