// ============================================================
// Layer 3 — MultiLabelDataset Domain Type
// ============================================================
// A feature matrix X of token ids and a label matrix Y of
// multi-hot rows, checked once at construction:
//
//   X = [[1, 2, 0, 0],      Y = [[1, 1, 0],
//        [3, 0, 0, 0]]           [0, 0, 1]]
//
//   - |X| == |Y|
//   - every row of X has the same width (zero-padded)
//   - every row of Y has the same width (number of classes)
//   - every label entry is 0 or 1
//
// Once a MultiLabelDataset exists, nothing downstream has to
// re-check shapes.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)

use thiserror::Error;

/// Shape and content errors raised while building a dataset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset is empty")]
    Empty,

    #[error("feature matrix has {features} rows but label matrix has {labels} rows")]
    RowCountMismatch { features: usize, labels: usize },

    #[error("feature row {row} has width {found}, expected {expected}")]
    RaggedFeatures { row: usize, expected: usize, found: usize },

    #[error("label row {row} has width {found}, expected {expected}")]
    RaggedLabels { row: usize, expected: usize, found: usize },

    #[error("label at row {row}, column {column} is {value}, expected 0 or 1")]
    NonBinaryLabel { row: usize, column: usize, value: u8 },
}

/// A rectangular (features, labels) pair with validated dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiLabelDataset {
    features: Vec<Vec<u32>>,
    labels:   Vec<Vec<u8>>,
}

impl MultiLabelDataset {
    /// Validate and wrap a feature matrix and a label matrix.
    pub fn new(features: Vec<Vec<u32>>, labels: Vec<Vec<u8>>) -> Result<Self, DatasetError> {
        validate_shapes(&features, &labels)?;
        Ok(Self { features, labels })
    }

    /// Number of rows (samples)
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Width of every feature row (the padded sequence length)
    pub fn seq_len(&self) -> usize {
        self.features[0].len()
    }

    /// Width of every label row (the number of classes)
    pub fn num_classes(&self) -> usize {
        self.labels[0].len()
    }

    pub fn features(&self) -> &[Vec<u32>] {
        &self.features
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    /// Largest token id present; 0 if every row is pure padding
    pub fn max_token_id(&self) -> u32 {
        self.features
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Iterate over (features, labels) row pairs in order
    pub fn rows(&self) -> impl Iterator<Item = (&[u32], &[u8])> {
        self.features
            .iter()
            .zip(self.labels.iter())
            .map(|(x, y)| (x.as_slice(), y.as_slice()))
    }
}

/// Inspect a raw (X, Y) pair and report whether it is multi-label.
///
/// Fails with a [`DatasetError`] when the pair is malformed; never
/// mutates its inputs.
pub fn is_multilabel(features: &[Vec<u32>], labels: &[Vec<u8>]) -> Result<bool, DatasetError> {
    validate_shapes(features, labels)?;
    Ok(labels_are_multilabel(labels))
}

/// A label matrix is multi-label when it has more than one column
/// and at least one row is not one-hot: either several classes are
/// active at once, or none are.
fn labels_are_multilabel(labels: &[Vec<u8>]) -> bool {
    let Some(first) = labels.first() else {
        return false;
    };
    if first.len() <= 1 {
        return false;
    }

    labels.iter().any(|row| {
        let active = row.iter().filter(|&&v| v == 1).count();
        active != 1
    })
}

fn validate_shapes(features: &[Vec<u32>], labels: &[Vec<u8>]) -> Result<(), DatasetError> {
    if features.len() != labels.len() {
        return Err(DatasetError::RowCountMismatch {
            features: features.len(),
            labels:   labels.len(),
        });
    }
    if features.is_empty() {
        return Err(DatasetError::Empty);
    }

    let seq_len = features[0].len();
    if let Some((row, x)) = features.iter().enumerate().find(|(_, x)| x.len() != seq_len) {
        return Err(DatasetError::RaggedFeatures { row, expected: seq_len, found: x.len() });
    }

    let num_classes = labels[0].len();
    if let Some((row, y)) = labels.iter().enumerate().find(|(_, y)| y.len() != num_classes) {
        return Err(DatasetError::RaggedLabels { row, expected: num_classes, found: y.len() });
    }

    for (row, y) in labels.iter().enumerate() {
        if let Some((column, &value)) = y.iter().enumerate().find(|(_, &v)| v > 1) {
            return Err(DatasetError::NonBinaryLabel { row, column, value });
        }
    }

    Ok(())
}
