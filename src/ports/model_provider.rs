//! Model provider port: how a request gets hold of the classifier.

use std::sync::Arc;

use crate::domain::ModelLoadError;
use crate::ports::Classifier;

/// Supplies the classifier for one prediction request.
///
/// A provider may hand out a model loaded once at startup or read the
/// artifact again on every call.
pub trait ModelProvider: Send + Sync {
    type Model: Classifier;

    /// Get the model for the current request.
    ///
    /// # Errors
    /// Returns `ModelLoadError` if the artifact cannot be located, verified
    /// or deserialized.
    fn model(&self) -> Result<Arc<Self::Model>, ModelLoadError>;
}
