//! Model providers: resident (loaded once) and reloading (per request).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::artifact::{LogisticModel, Verification};
use crate::domain::ModelLoadError;
use crate::ports::{Classifier, ModelProvider};

/// A model loaded once and shared read-only for the process lifetime.
pub struct ResidentModel<C> {
    model: Arc<C>,
}

impl<C: Classifier> ResidentModel<C> {
    #[must_use]
    pub fn new(model: C) -> Self {
        Self {
            model: Arc::new(model),
        }
    }
}

impl ResidentModel<LogisticModel> {
    /// Load the artifact now and keep it for every later request.
    ///
    /// # Errors
    /// Returns `ModelLoadError` if the artifact cannot be loaded.
    pub fn load(model_path: &Path, verification: &Verification) -> Result<Self, ModelLoadError> {
        Ok(Self::new(LogisticModel::load(model_path, verification)?))
    }
}

impl<C: Classifier> ModelProvider for ResidentModel<C> {
    type Model = C;

    fn model(&self) -> Result<Arc<C>, ModelLoadError> {
        Ok(Arc::clone(&self.model))
    }
}

/// Reads the artifact from disk on every request; nothing is cached.
pub struct ReloadingModel {
    model_path: PathBuf,
    verification: Verification,
}

impl ReloadingModel {
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>, verification: Verification) -> Self {
        Self {
            model_path: model_path.into(),
            verification,
        }
    }
}

impl ModelProvider for ReloadingModel {
    type Model = LogisticModel;

    fn model(&self) -> Result<Arc<LogisticModel>, ModelLoadError> {
        tracing::debug!("Reloading model artifact from {:?}", self.model_path);
        LogisticModel::load(&self.model_path, &self.verification).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::DEFAULT_ARTIFACT_FILE;
    use tempfile::tempdir;

    const MODEL_JSON: &str = r#"{
        "format_version": 1,
        "model_type": "logistic_regression",
        "feature_names": ["x"],
        "coefficients": [1.0],
        "intercept": 0.0
    }"#;

    #[test]
    fn test_resident_model_survives_artifact_removal() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(DEFAULT_ARTIFACT_FILE);
        std::fs::write(&path, MODEL_JSON).expect("write model");

        let provider = ResidentModel::load(temp.path(), &Verification::Unsigned).expect("load");
        std::fs::remove_file(&path).expect("remove");

        let first = provider.model().expect("resident");
        let second = provider.model().expect("resident");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reloading_model_reads_every_call() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join(DEFAULT_ARTIFACT_FILE);
        std::fs::write(&path, MODEL_JSON).expect("write model");

        let provider = ReloadingModel::new(temp.path(), Verification::Unsigned);
        assert_eq!(provider.model().expect("load").input_dim(), 1);

        std::fs::remove_file(&path).expect("remove");
        assert!(matches!(provider.model(), Err(ModelLoadError::NotFound(_))));
    }
}
