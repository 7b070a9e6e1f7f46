//! Domain layer: Core business types and logic.
//!
//! Pure types for the screening pipeline: the clinical record, its label
//! encoding, feature vectors and the binary verdict.

pub mod encoding;
mod features;
mod model;
mod prediction;
mod record;

pub use encoding::{encode, EncodingError};
pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use model::ModelLoadError;
pub use prediction::{Prediction, ADVISORY_NOTE};
pub use record::{
    Categorical, ChestPainType, Choice, ClinicalRecord, RestingEcg, Sex, StSlope, Thalassemia,
};
