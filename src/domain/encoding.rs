//! Label encoding: clinical record to classifier feature vector.

use super::features::{FeatureVector, FEATURE_COUNT};
use super::record::{Categorical, Choice, ClinicalRecord};

/// Errors from encoding a clinical record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("{field}: no encoding for value {value:?}")]
    Unrecognized { field: &'static str, value: String },
}

/// Encode a record into the fixed 13-feature order the classifier expects.
///
/// Numeric fields pass through unchanged; categorical and boolean fields are
/// replaced by their training codes. Numeric ranges are not checked here (see
/// [`ClinicalRecord::validate`]).
///
/// # Errors
/// Returns [`EncodingError::Unrecognized`] for the first categorical field
/// holding a value with no code.
pub fn encode(record: &ClinicalRecord) -> Result<FeatureVector, EncodingError> {
    let values = vec![
        f64::from(record.age),
        code(&record.sex)?,
        code(&record.chest_pain_type)?,
        f64::from(record.resting_blood_pressure),
        f64::from(record.cholesterol),
        flag(record.fasting_blood_sugar_high),
        code(&record.resting_ecg)?,
        f64::from(record.max_heart_rate),
        flag(record.exercise_induced_angina),
        record.st_depression,
        code(&record.st_slope)?,
        f64::from(record.num_major_vessels),
        code(&record.thalassemia)?,
    ];
    debug_assert_eq!(values.len(), FEATURE_COUNT);

    tracing::debug!("Encoded clinical record into {} features", values.len());
    Ok(FeatureVector::new(values))
}

fn code<T: Categorical>(choice: &Choice<T>) -> Result<f64, EncodingError> {
    match choice {
        Choice::Known(option) => Ok(f64::from(option.code())),
        Choice::Unrecognized(raw) => Err(EncodingError::Unrecognized {
            field: T::FIELD,
            value: raw.clone(),
        }),
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
