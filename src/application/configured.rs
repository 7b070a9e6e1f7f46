//! Predictor assembled from runtime settings.

use std::sync::Arc;

use crate::adapters::artifact::LogisticModel;
use crate::adapters::provider::{ReloadingModel, ResidentModel};
use crate::application::Predictor;
use crate::config::{ReloadPolicy, Settings};
use crate::domain::{ClinicalRecord, FeatureVector, Prediction};
use crate::CardioscreenError;

/// The predictor behind whichever reload policy is configured.
pub enum ConfiguredPredictor {
    Resident(Predictor<ResidentModel<LogisticModel>>),
    Reloading(Predictor<ReloadingModel>),
}

impl ConfiguredPredictor {
    /// Build the predictor. With [`ReloadPolicy::Once`] the artifact is
    /// loaded (and verified) here, so a bad artifact fails startup.
    ///
    /// # Errors
    /// Returns `ModelLoad` if the key or the artifact is invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self, CardioscreenError> {
        let verification = settings.verification()?;
        match settings.reload {
            ReloadPolicy::Once => {
                let provider = ResidentModel::load(&settings.model_path, &verification)?;
                Ok(Self::Resident(Predictor::new(Arc::new(provider))))
            }
            ReloadPolicy::PerRequest => {
                tracing::info!(
                    "Model artifact will be reloaded for every prediction ({:?})",
                    settings.model_path
                );
                let provider = ReloadingModel::new(settings.model_path.clone(), verification);
                Ok(Self::Reloading(Predictor::new(Arc::new(provider))))
            }
        }
    }

    /// See [`Predictor::predict`].
    ///
    /// # Errors
    /// Propagates the predictor's errors unchanged.
    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction, CardioscreenError> {
        match self {
            Self::Resident(p) => p.predict(vector),
            Self::Reloading(p) => p.predict(vector),
        }
    }

    /// See [`Predictor::assess`].
    ///
    /// # Errors
    /// Propagates the predictor's errors unchanged.
    pub fn assess(&self, record: &ClinicalRecord) -> Result<Prediction, CardioscreenError> {
        match self {
            Self::Resident(p) => p.assess(record),
            Self::Reloading(p) => p.assess(record),
        }
    }
}
