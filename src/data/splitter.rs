// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles rows with a seeded RNG and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to measure loss on held-out rows
//
// The default workflow validates on the training rows themselves
// (train_fraction = 1.0 skips this step entirely); a held-out
// split is opt-in via TrainConfig::val_fraction.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::dataset::{DatasetError, MultiLabelDataset};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - RNG seed, so the same seed gives the same split
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    // e.g. 100 samples * 0.8 = 80 → first 80 are training
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], val = [split_at..total]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

/// Split a validated dataset, keeping features and labels aligned.
/// Fails if either side would end up empty.
pub fn split_dataset(
    dataset:        &MultiLabelDataset,
    train_fraction: f64,
    seed:           u64,
) -> Result<(MultiLabelDataset, MultiLabelDataset), DatasetError> {
    let rows: Vec<(Vec<u32>, Vec<u8>)> = dataset
        .rows()
        .map(|(x, y)| (x.to_vec(), y.to_vec()))
        .collect();

    let (train, val) = split_train_val(rows, train_fraction, seed);
    let (train_x, train_y): (Vec<_>, Vec<_>) = train.into_iter().unzip();
    let (val_x, val_y): (Vec<_>, Vec<_>)     = val.into_iter().unzip();

    Ok((
        MultiLabelDataset::new(train_x, train_y)?,
        MultiLabelDataset::new(val_x, val_y)?,
    ))
}
