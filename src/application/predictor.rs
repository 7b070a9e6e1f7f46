//! Predictor: runs one clinical record or feature vector through the model.
//!
//! Single-shot and stateless per request: no retries, no fallback label.
//! Any failure is returned to the caller as-is.

use std::sync::Arc;

use crate::domain::{encode, ClinicalRecord, FeatureVector, Prediction, FEATURE_NAMES};
use crate::ports::{Classifier, ModelProvider};
use crate::CardioscreenError;

/// Use case: binary heart disease prediction.
pub struct Predictor<P>
where
    P: ModelProvider,
{
    provider: Arc<P>,
}

impl<P> Predictor<P>
where
    P: ModelProvider,
{
    /// Create a predictor backed by `provider`.
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Predict the label for a single feature vector.
    ///
    /// # Errors
    /// - `ModelLoad` if the provider cannot supply the model
    /// - `ShapeMismatch` if the vector length differs from the model's input dimensionality
    /// - `Validation` if any feature is NaN or infinite
    /// - `InvalidOutput` if the model returns no usable label
    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction, CardioscreenError> {
        let model = self.provider.model()?;

        let expected = model.input_dim();
        if vector.len() != expected {
            return Err(CardioscreenError::ShapeMismatch {
                expected,
                actual: vector.len(),
            });
        }

        // NaN compares false against the threshold and would read as label 0.
        if let Some(index) = vector.as_slice().iter().position(|x| !x.is_finite()) {
            let name = FEATURE_NAMES
                .get(index)
                .map_or_else(|| format!("#{index}"), |n| (*n).to_string());
            return Err(CardioscreenError::Validation(format!(
                "feature {name} is not finite"
            )));
        }

        // Single-row batch.
        let labels = model.predict_batch(std::slice::from_ref(vector))?;
        let raw = match labels.as_slice() {
            [raw] => *raw,
            other => {
                return Err(CardioscreenError::InvalidOutput(format!(
                    "expected 1 label for 1 row, got {}",
                    other.len()
                )))
            }
        };

        let prediction = Prediction::from_raw_label(raw).ok_or_else(|| {
            CardioscreenError::InvalidOutput(format!("non-finite label {raw}"))
        })?;

        tracing::info!(
            "Prediction complete: verdict={}, label={}",
            prediction,
            prediction.label()
        );
        Ok(prediction)
    }

    /// Encode a clinical record and predict its label.
    ///
    /// # Errors
    /// Returns `Encoding` for unrecognized categorical values, `Validation`
    /// for numeric fields outside their ranges, otherwise the errors of
    /// [`Predictor::predict`].
    pub fn assess(&self, record: &ClinicalRecord) -> Result<Prediction, CardioscreenError> {
        tracing::debug!("Step 1: Encoding clinical record...");
        let vector = encode(record)?;

        tracing::debug!("Step 2: Checking value ranges...");
        record
            .validate()
            .map_err(|errors| CardioscreenError::Validation(errors.join(", ")))?;

        tracing::debug!("Step 3: Running classifier...");
        self.predict(&vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifact::{LogisticModel, Verification};
    use crate::adapters::provider::{ReloadingModel, ResidentModel};
    use crate::domain::{Choice, ModelLoadError, FEATURE_COUNT};
    use std::path::Path;

    /// Returns a fixed label sequence regardless of input.
    struct FixedLabels {
        labels: Vec<f64>,
    }

    impl Classifier for FixedLabels {
        fn input_dim(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict_batch(&self, _batch: &[FeatureVector]) -> Result<Vec<f64>, CardioscreenError> {
            Ok(self.labels.clone())
        }
    }

    fn fixed(labels: Vec<f64>) -> Predictor<ResidentModel<FixedLabels>> {
        Predictor::new(Arc::new(ResidentModel::new(FixedLabels { labels })))
    }

    fn shipped() -> Predictor<ResidentModel<LogisticModel>> {
        let provider = ResidentModel::load(Path::new("models"), &Verification::Unsigned)
            .expect("Model should load for tests");
        Predictor::new(Arc::new(provider))
    }

    #[test]
    fn test_predict_returns_binary_label() {
        let predictor = shipped();
        let vector = encode(&ClinicalRecord::sample()).expect("encode");

        let prediction = predictor.predict(&vector).expect("predict");
        assert!(prediction.label() <= 1);
    }

    #[test]
    fn test_assess_default_and_sample_records() {
        let predictor = shipped();
        for record in [ClinicalRecord::default(), ClinicalRecord::sample()] {
            let prediction = predictor.assess(&record).expect("assess");
            assert!(matches!(
                prediction,
                Prediction::Likely | Prediction::NotLikely
            ));
        }
    }

    #[test]
    fn test_short_vector_is_shape_mismatch() {
        let predictor = shipped();
        let err = predictor
            .predict(&FeatureVector::new(vec![0.0; 12]))
            .expect_err("must fail");
        assert!(matches!(
            err,
            CardioscreenError::ShapeMismatch {
                expected: 13,
                actual: 12
            }
        ));
    }

    #[test]
    fn test_non_finite_features_are_rejected() {
        let predictor = shipped();
        let sample = encode(&ClinicalRecord::sample()).expect("encode");

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut values = sample.as_slice().to_vec();
            values[9] = bad;
            let err = predictor
                .predict(&FeatureVector::new(values))
                .expect_err("must fail");
            let CardioscreenError::Validation(message) = err else {
                panic!("expected validation error");
            };
            assert!(message.contains("st_depression"), "{message}");
        }
    }

    #[test]
    fn test_assess_rejects_nan_record() {
        let predictor = shipped();
        let record = ClinicalRecord {
            st_depression: f64::NAN,
            ..ClinicalRecord::sample()
        };
        assert!(matches!(
            predictor.assess(&record),
            Err(CardioscreenError::Validation(_))
        ));
    }

    #[test]
    fn test_assess_reports_encoding_before_ranges() {
        let predictor = fixed(vec![1.0]);
        let record = ClinicalRecord {
            age: 250,
            thalassemia: Choice::Unrecognized("Severe".into()),
            ..ClinicalRecord::sample()
        };
        assert!(matches!(
            predictor.assess(&record),
            Err(CardioscreenError::Encoding(_))
        ));

        let record = ClinicalRecord {
            age: 250,
            ..ClinicalRecord::sample()
        };
        let err = predictor.assess(&record).expect_err("must fail");
        assert!(matches!(err, CardioscreenError::Validation(_)));
        assert!(err.to_string().contains("Age 250"));
    }

    #[test]
    fn test_assess_surfaces_encoding_error() {
        let predictor = fixed(vec![1.0]);
        let record = ClinicalRecord {
            sex: Choice::Unrecognized("Unknown".into()),
            ..ClinicalRecord::default()
        };
        let err = predictor.assess(&record).expect_err("must fail");
        assert!(matches!(err, CardioscreenError::Encoding(_)));
    }

    #[test]
    fn test_label_normalization() {
        let vector = encode(&ClinicalRecord::default()).expect("encode");
        assert_eq!(
            fixed(vec![0.0]).predict(&vector).expect("predict"),
            Prediction::NotLikely
        );
        assert_eq!(
            fixed(vec![1.0]).predict(&vector).expect("predict"),
            Prediction::Likely
        );
    }

    #[test]
    fn test_unusable_output_is_an_error() {
        let vector = encode(&ClinicalRecord::default()).expect("encode");
        for labels in [vec![], vec![0.0, 1.0], vec![f64::NAN]] {
            let err = fixed(labels).predict(&vector).expect_err("must fail");
            assert!(matches!(err, CardioscreenError::InvalidOutput(_)));
        }
    }

    #[test]
    fn test_missing_artifact_is_model_load_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let predictor = Predictor::new(Arc::new(ReloadingModel::new(
            temp.path(),
            Verification::Unsigned,
        )));
        let vector = encode(&ClinicalRecord::default()).expect("encode");

        let err = predictor.predict(&vector).expect_err("must fail");
        assert!(matches!(
            err,
            CardioscreenError::ModelLoad(ModelLoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_reloading_and_resident_agree() {
        let resident = shipped();
        let reloading = Predictor::new(Arc::new(ReloadingModel::new(
            "models",
            Verification::Unsigned,
        )));
        let record = ClinicalRecord::sample();

        assert_eq!(
            resident.assess(&record).expect("resident"),
            reloading.assess(&record).expect("reloading")
        );
    }
}
