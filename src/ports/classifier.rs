//! Classifier port: Trait for a pre-trained binary classification model.
//!
//! This trait abstracts the model implementation from the application logic.

use crate::domain::FeatureVector;
use crate::CardioscreenError;

/// Trait for a loaded, immutable classification model.
///
/// Implementations are read-only after construction and may be shared
/// across threads without coordination.
pub trait Classifier: Send + Sync {
    /// Number of features each input row must have.
    fn input_dim(&self) -> usize;

    /// Predict a label for every row of the batch.
    ///
    /// Labels are returned raw (as the model produced them); the caller is
    /// responsible for normalizing them.
    ///
    /// # Errors
    /// Returns `CardioscreenError::ShapeMismatch` if any row has the wrong
    /// number of features.
    fn predict_batch(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, CardioscreenError>;
}
