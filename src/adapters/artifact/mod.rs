//! Model artifact adapter: loads the pre-trained classifier from disk.
//!
//! The artifact is a JSON export of a logistic-regression model produced by an
//! external training process. Training is out of scope here; the artifact
//! shipped in `models/` carries illustrative hand-set coefficients, not a
//! trained export, and only exercises the pipeline.
//!
//! # Security
//!
//! - When a developer public key is configured, the artifact directory must
//!   carry a signed manifest (`manifest.json` + `model.sig`, Ed25519)
//! - The manifest binds the artifact by SHA-256; the bytes that are hashed are
//!   the same bytes that get deserialized
//! - Without a configured key the artifact loads unsigned, with a warning
//!
//! # Signing
//!
//! 1. Generate a keypair: `cargo run --bin sign_model -- keygen --out <seed_file>`
//! 2. Sign the model directory: `cargo run --bin sign_model -- sign <model_dir> --seed <seed_file>`
//! 3. Set `CARDIOSCREEN_MODEL_PUBKEY_B64` to the printed public key
//!
//! Step 2 is [`sign_artifact`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{FeatureVector, ModelLoadError, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::Classifier;
use crate::CardioscreenError;

/// File name looked up when the configured model path is a directory.
pub const DEFAULT_ARTIFACT_FILE: &str = "heart_disease_model.json";

/// Signed manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Detached Ed25519 signature over the manifest bytes.
pub const SIGNATURE_FILE: &str = "model.sig";

const SUPPORTED_FORMAT_VERSION: u32 = 1;
const SUPPORTED_MODEL_TYPE: &str = "logistic_regression";

fn default_threshold() -> f64 {
    0.5
}

/// Model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedModel {
    pub format_version: u32,
    pub model_type: String,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_scale: Option<Vec<f64>>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Manifest binding artifact files to their SHA-256 digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was written.
    pub created_at: i64,
    /// File name (relative to the manifest) -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

/// How artifacts are authenticated before loading.
#[derive(Debug, Clone)]
pub enum Verification {
    /// Load without checking a signature.
    Unsigned,
    /// Require a manifest signed by this key.
    Ed25519(VerifyingKey),
}

impl Verification {
    /// Build an Ed25519 verification from a base64-encoded 32-byte public key.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Signature` if the key is not valid base64 or
    /// not a valid Ed25519 point.
    pub fn from_public_key_b64(b64: &str) -> Result<Self, ModelLoadError> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| ModelLoadError::Signature(format!("Invalid public key base64: {e}")))?;
        let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
            ModelLoadError::Signature(format!(
                "Public key must be 32 bytes (got {})",
                raw.len()
            ))
        })?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| ModelLoadError::Signature(format!("Invalid public key: {e}")))?;
        Ok(Self::Ed25519(key))
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Resolve the configured model path to the artifact file.
#[must_use]
pub fn resolve_artifact_path(model_path: &Path) -> PathBuf {
    if model_path.is_dir() {
        model_path.join(DEFAULT_ARTIFACT_FILE)
    } else {
        model_path.to_path_buf()
    }
}

/// Logistic-regression classifier restored from an artifact.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    params: ExportedModel,
}

impl LogisticModel {
    /// Load and validate the artifact at `model_path` (file or directory).
    ///
    /// # Errors
    /// Returns `ModelLoadError` if the artifact is missing, unreadable,
    /// fails verification or has inconsistent parameters.
    pub fn load(model_path: &Path, verification: &Verification) -> Result<Self, ModelLoadError> {
        let artifact_path = resolve_artifact_path(model_path);
        if !artifact_path.is_file() {
            return Err(ModelLoadError::NotFound(artifact_path));
        }

        let bytes = fs::read(&artifact_path).map_err(|source| ModelLoadError::Io {
            path: artifact_path.clone(),
            source,
        })?;

        match verification {
            Verification::Ed25519(key) => verify_artifact(&artifact_path, &bytes, key)?,
            Verification::Unsigned => tracing::warn!(
                "Loading UNSIGNED model artifact {:?} (no public key configured)",
                artifact_path
            ),
        }

        let params: ExportedModel = serde_json::from_slice(&bytes)
            .map_err(|e| ModelLoadError::Malformed(e.to_string()))?;
        let model = Self::from_params(params)?;

        tracing::info!(
            "Loaded model from {:?} (type={}, n_features={}, threshold={})",
            artifact_path,
            model.params.model_type,
            model.input_dim(),
            model.params.threshold
        );

        Ok(model)
    }

    /// Validate exported parameters.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Malformed` on unsupported versions or
    /// inconsistent parameter lengths.
    pub fn from_params(params: ExportedModel) -> Result<Self, ModelLoadError> {
        if params.format_version != SUPPORTED_FORMAT_VERSION {
            return Err(ModelLoadError::Malformed(format!(
                "Unsupported format_version: {}",
                params.format_version
            )));
        }
        if params.model_type != SUPPORTED_MODEL_TYPE {
            return Err(ModelLoadError::Malformed(format!(
                "Unsupported model_type: {:?}",
                params.model_type
            )));
        }

        let n = params.feature_names.len();
        if n == 0 {
            return Err(ModelLoadError::Malformed("Model declares no features".into()));
        }
        if params.coefficients.len() != n {
            return Err(ModelLoadError::Malformed(format!(
                "coefficients has {} entries, feature_names has {n}",
                params.coefficients.len()
            )));
        }
        for (name, values) in [
            ("scaler_mean", &params.scaler_mean),
            ("scaler_scale", &params.scaler_scale),
        ] {
            if let Some(values) = values {
                if values.len() != n {
                    return Err(ModelLoadError::Malformed(format!(
                        "{name} has {} entries, feature_names has {n}",
                        values.len()
                    )));
                }
            }
        }
        if let Some(scale) = &params.scaler_scale {
            if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
                return Err(ModelLoadError::Malformed(
                    "scaler_scale entries must be finite and non-zero".into(),
                ));
            }
        }
        if !params.intercept.is_finite() || params.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelLoadError::Malformed(
                "Model parameters must be finite".into(),
            ));
        }
        if !(params.threshold > 0.0 && params.threshold < 1.0) {
            return Err(ModelLoadError::Malformed(format!(
                "threshold {} outside (0, 1)",
                params.threshold
            )));
        }

        if n != FEATURE_COUNT || params.feature_names.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b)
        {
            tracing::warn!(
                "Model feature schema differs from the encoder's ({} features)",
                n
            );
        }

        Ok(Self { params })
    }

    /// Positive-class probability for one row of the right length.
    fn probability(&self, row: &[f64]) -> f64 {
        let p = &self.params;
        let z = row
            .iter()
            .enumerate()
            .map(|(i, x)| {
                let mean = p.scaler_mean.as_ref().map_or(0.0, |m| m[i]);
                let scale = p.scaler_scale.as_ref().map_or(1.0, |s| s[i]);
                p.coefficients[i] * (x - mean) / scale
            })
            .sum::<f64>()
            + p.intercept;
        1.0 / (1.0 + (-z).exp())
    }
}

impl Classifier for LogisticModel {
    fn input_dim(&self) -> usize {
        self.params.feature_names.len()
    }

    fn predict_batch(&self, batch: &[FeatureVector]) -> Result<Vec<f64>, CardioscreenError> {
        let expected = self.input_dim();
        batch
            .iter()
            .map(|row| {
                if row.len() != expected {
                    return Err(CardioscreenError::ShapeMismatch {
                        expected,
                        actual: row.len(),
                    });
                }
                let probability = self.probability(row.as_slice());
                Ok(if probability > self.params.threshold {
                    1.0
                } else {
                    0.0
                })
            })
            .collect()
    }
}

/// Check the signed manifest in the artifact's directory against `bytes`.
fn verify_artifact(
    artifact_path: &Path,
    bytes: &[u8],
    key: &VerifyingKey,
) -> Result<(), ModelLoadError> {
    let base_dir = artifact_path.parent().unwrap_or_else(|| Path::new("."));
    let sig_path = base_dir.join(SIGNATURE_FILE);
    let manifest_path = base_dir.join(MANIFEST_FILE);

    if !sig_path.exists() || !manifest_path.exists() {
        tracing::error!(
            "Model signature not found at {:?}; a public key is configured so signed models are required",
            sig_path
        );
        return Err(ModelLoadError::Signature(format!(
            "{SIGNATURE_FILE} and {MANIFEST_FILE} are required next to the artifact"
        )));
    }

    let sig_bytes = fs::read(&sig_path)
        .map_err(|e| ModelLoadError::Signature(format!("Failed to read signature: {e}")))?;
    let sig_array: [u8; 64] = sig_bytes.as_slice().try_into().map_err(|_| {
        ModelLoadError::Signature("Invalid signature length (expected 64 bytes)".into())
    })?;
    let signature = Signature::from_bytes(&sig_array);

    let manifest_bytes = fs::read(&manifest_path)
        .map_err(|e| ModelLoadError::Signature(format!("Failed to read manifest: {e}")))?;
    key.verify(&manifest_bytes, &signature)
        .map_err(|_| ModelLoadError::Signature("Invalid model signature".into()))?;

    let manifest: SignedModelManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| ModelLoadError::Signature(format!("Invalid {MANIFEST_FILE} format: {e}")))?;
    if manifest.version != 1 {
        return Err(ModelLoadError::Signature(format!(
            "Unsupported manifest version: {}",
            manifest.version
        )));
    }

    let file_name = artifact_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ModelLoadError::Signature("Artifact path has no file name".into()))?;
    let expected = manifest.files.get(file_name).ok_or_else(|| {
        ModelLoadError::Signature(format!("Manifest does not bind {file_name}"))
    })?;
    if !constant_time_eq_str(&expected.to_ascii_lowercase(), &sha256_hex(bytes)) {
        return Err(ModelLoadError::Signature(format!(
            "Hash mismatch for {file_name}"
        )));
    }

    tracing::info!(
        "Model signature verified (manifest created_at={})",
        manifest.created_at
    );
    Ok(())
}

/// Write `manifest.json` and `model.sig` next to the artifact at
/// `model_path` (file or directory), binding it by SHA-256.
///
/// Returns the manifest and signature paths.
///
/// # Errors
/// Returns `NotFound` if there is no artifact, `Io` if a file cannot be
/// read or written.
pub fn sign_artifact(
    model_path: &Path,
    signing_key: &SigningKey,
) -> Result<(PathBuf, PathBuf), ModelLoadError> {
    let artifact_path = resolve_artifact_path(model_path);
    if !artifact_path.is_file() {
        return Err(ModelLoadError::NotFound(artifact_path));
    }
    let file_name = artifact_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ModelLoadError::Malformed("Artifact file name is not valid UTF-8".into()))?
        .to_string();
    let base_dir = artifact_path.parent().unwrap_or_else(|| Path::new("."));

    let bytes = fs::read(&artifact_path).map_err(|source| ModelLoadError::Io {
        path: artifact_path.clone(),
        source,
    })?;

    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let manifest = SignedModelManifest {
        version: 1,
        created_at,
        files: BTreeMap::from([(file_name, sha256_hex(&bytes))]),
    };
    let manifest_bytes = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| ModelLoadError::Malformed(format!("Cannot serialize {MANIFEST_FILE}: {e}")))?;
    let signature: Signature = signing_key.sign(&manifest_bytes);
    let sig_bytes = signature.to_bytes();

    let manifest_path = base_dir.join(MANIFEST_FILE);
    let sig_path = base_dir.join(SIGNATURE_FILE);
    for (path, contents) in [
        (&manifest_path, manifest_bytes.as_slice()),
        (&sig_path, sig_bytes.as_slice()),
    ] {
        fs::write(path, contents).map_err(|source| ModelLoadError::Io {
            path: path.clone(),
            source,
        })?;
    }

    tracing::info!("Signed model artifact {:?}", artifact_path);
    Ok((manifest_path, sig_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use tempfile::tempdir;

    fn single_feature_model(intercept: f64) -> ExportedModel {
        ExportedModel {
            format_version: 1,
            model_type: "logistic_regression".into(),
            feature_names: vec!["x".into()],
            coefficients: vec![1.0],
            intercept,
            scaler_mean: None,
            scaler_scale: None,
            threshold: 0.5,
        }
    }

    fn write_model(dir: &Path, model: &ExportedModel) -> PathBuf {
        let path = dir.join(DEFAULT_ARTIFACT_FILE);
        let json = serde_json::to_vec(model).expect("serialize model");
        fs::write(&path, json).expect("write model");
        path
    }

    fn test_signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn write_signed_manifest(dir: &Path, signing_key: &SigningKey, files: &[(&str, Vec<u8>)]) {
        let manifest = SignedModelManifest {
            version: 1,
            created_at: 1_700_000_000,
            files: files
                .iter()
                .map(|(name, contents)| ((*name).to_string(), sha256_hex(contents)))
                .collect(),
        };
        let manifest_bytes = serde_json::to_vec(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &manifest_bytes).expect("write manifest");

        let signature: Signature = signing_key.sign(&manifest_bytes);
        fs::write(dir.join(SIGNATURE_FILE), signature.to_bytes()).expect("write signature");
    }

    fn row(values: &[f64]) -> FeatureVector {
        FeatureVector::new(values.to_vec())
    }

    #[test]
    fn test_load_unsigned_from_directory() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &single_feature_model(0.25));

        let model = LogisticModel::load(temp.path(), &Verification::Unsigned).expect("load");
        assert_eq!(model.input_dim(), 1);
    }

    #[test]
    fn test_load_from_file_path() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &single_feature_model(0.0));

        assert!(LogisticModel::load(&path, &Verification::Unsigned).is_ok());
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let temp = tempdir().expect("tempdir");
        let err = LogisticModel::load(temp.path(), &Verification::Unsigned).expect_err("must fail");
        assert!(matches!(err, ModelLoadError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_artifact_is_malformed() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(DEFAULT_ARTIFACT_FILE), b"\x80\x04\x95pickle").expect("write");

        let err = LogisticModel::load(temp.path(), &Verification::Unsigned).expect_err("must fail");
        assert!(matches!(err, ModelLoadError::Malformed(_)));
    }

    #[test]
    fn test_inconsistent_parameters_are_rejected() {
        let mut params = single_feature_model(0.0);
        params.coefficients = vec![1.0, 2.0];
        assert!(matches!(
            LogisticModel::from_params(params),
            Err(ModelLoadError::Malformed(_))
        ));

        let mut params = single_feature_model(0.0);
        params.scaler_scale = Some(vec![0.0]);
        assert!(LogisticModel::from_params(params).is_err());

        let mut params = single_feature_model(0.0);
        params.threshold = 1.0;
        assert!(LogisticModel::from_params(params).is_err());

        let mut params = single_feature_model(0.0);
        params.model_type = "random_forest".into();
        assert!(LogisticModel::from_params(params).is_err());
    }

    #[test]
    fn test_predict_batch_labels() {
        let model = LogisticModel::from_params(single_feature_model(0.0)).expect("valid");
        let labels = model
            .predict_batch(&[row(&[2.0]), row(&[-2.0]), row(&[0.0])])
            .expect("predict");
        // p == 0.5 at the boundary is not above the threshold.
        assert_eq!(labels, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_predict_applies_scaler() {
        let mut params = single_feature_model(0.0);
        params.scaler_mean = Some(vec![100.0]);
        params.scaler_scale = Some(vec![10.0]);
        let model = LogisticModel::from_params(params).expect("valid");

        let labels = model
            .predict_batch(&[row(&[110.0]), row(&[90.0])])
            .expect("predict");
        assert_eq!(labels, vec![1.0, 0.0]);
    }

    #[test]
    fn test_predict_batch_shape_mismatch() {
        let model = LogisticModel::from_params(single_feature_model(0.0)).expect("valid");
        let err = model
            .predict_batch(&[row(&[1.0, 2.0])])
            .expect_err("must fail");
        assert!(matches!(
            err,
            CardioscreenError::ShapeMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_load_signed_artifact() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &single_feature_model(0.0));
        let signing_key = test_signing_key();
        let bytes = fs::read(&path).expect("read model");
        write_signed_manifest(temp.path(), &signing_key, &[(DEFAULT_ARTIFACT_FILE, bytes)]);

        let verification = Verification::Ed25519(signing_key.verifying_key());
        assert!(LogisticModel::load(temp.path(), &verification).is_ok());
    }

    #[test]
    fn test_tampered_artifact_fails_verification() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &single_feature_model(0.0));
        let signing_key = test_signing_key();
        let bytes = fs::read(&path).expect("read model");
        write_signed_manifest(temp.path(), &signing_key, &[(DEFAULT_ARTIFACT_FILE, bytes)]);

        // Swap in different parameters after signing.
        write_model(temp.path(), &single_feature_model(5.0));

        let verification = Verification::Ed25519(signing_key.verifying_key());
        let err = LogisticModel::load(temp.path(), &verification).expect_err("must fail");
        assert!(err.to_string().contains("Hash mismatch"));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let temp = tempdir().expect("tempdir");
        let path = write_model(temp.path(), &single_feature_model(0.0));
        let bytes = fs::read(&path).expect("read model");
        write_signed_manifest(temp.path(), &test_signing_key(), &[(DEFAULT_ARTIFACT_FILE, bytes)]);

        let verification = Verification::Ed25519(test_signing_key().verifying_key());
        let err = LogisticModel::load(temp.path(), &verification).expect_err("must fail");
        assert!(matches!(err, ModelLoadError::Signature(_)));
    }

    #[test]
    fn test_missing_signature_fails_when_key_configured() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &single_feature_model(0.0));

        let verification = Verification::Ed25519(test_signing_key().verifying_key());
        let err = LogisticModel::load(temp.path(), &verification).expect_err("must fail");
        assert!(matches!(err, ModelLoadError::Signature(_)));
    }

    #[test]
    fn test_manifest_must_bind_loaded_file() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &single_feature_model(0.0));
        let signing_key = test_signing_key();
        write_signed_manifest(temp.path(), &signing_key, &[("other.json", b"{}".to_vec())]);

        let verification = Verification::Ed25519(signing_key.verifying_key());
        let err = LogisticModel::load(temp.path(), &verification).expect_err("must fail");
        assert!(err.to_string().contains("does not bind"));
    }

    #[test]
    fn test_sign_artifact_directory_round_trip() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &single_feature_model(0.0));
        let signing_key = test_signing_key();

        let (manifest_path, sig_path) =
            sign_artifact(temp.path(), &signing_key).expect("sign");
        assert_eq!(manifest_path, temp.path().join(MANIFEST_FILE));
        assert_eq!(fs::read(&sig_path).expect("read signature").len(), 64);

        let verification = Verification::Ed25519(signing_key.verifying_key());
        assert!(LogisticModel::load(temp.path(), &verification).is_ok());
    }

    #[test]
    fn test_sign_artifact_file_path_round_trip() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("custom_model.json");
        let json = serde_json::to_vec(&single_feature_model(0.0)).expect("serialize");
        fs::write(&path, json).expect("write model");
        let signing_key = test_signing_key();

        sign_artifact(&path, &signing_key).expect("sign");

        let verification = Verification::Ed25519(signing_key.verifying_key());
        assert!(LogisticModel::load(&path, &verification).is_ok());

        // A different key must not accept the same manifest.
        let other = Verification::Ed25519(test_signing_key().verifying_key());
        assert!(matches!(
            LogisticModel::load(&path, &other),
            Err(ModelLoadError::Signature(_))
        ));
    }

    #[test]
    fn test_sign_artifact_requires_artifact() {
        let temp = tempdir().expect("tempdir");
        assert!(matches!(
            sign_artifact(temp.path(), &test_signing_key()),
            Err(ModelLoadError::NotFound(_))
        ));
    }

    #[test]
    fn test_public_key_b64_parsing() {
        let key = test_signing_key().verifying_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.to_bytes());
        assert!(matches!(
            Verification::from_public_key_b64(&b64),
            Ok(Verification::Ed25519(_))
        ));
        assert!(Verification::from_public_key_b64("not base64!").is_err());
        assert!(Verification::from_public_key_b64("AAAA").is_err());
    }

    #[test]
    fn test_shipped_model_loads() {
        let model = LogisticModel::load(Path::new("models"), &Verification::Unsigned)
            .expect("shipped model should load");
        assert_eq!(model.input_dim(), FEATURE_COUNT);
    }
}
