//! Runtime settings read from environment variables.

use std::path::PathBuf;

use crate::adapters::artifact::Verification;
use crate::CardioscreenError;

const MODEL_PATH_ENV: &str = "CARDIOSCREEN_MODEL_PATH";
const MODEL_RELOAD_ENV: &str = "CARDIOSCREEN_MODEL_RELOAD";
const MODEL_PUBKEY_ENV: &str = "CARDIOSCREEN_MODEL_PUBKEY_B64";
const LOG_MODE_ENV: &str = "CARDIOSCREEN_LOG_MODE";
const LOG_FILE_ENV: &str = "CARDIOSCREEN_LOG_FILE";

/// When the model artifact is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Load at startup, share for the process lifetime.
    Once,
    /// Read the artifact again for every prediction.
    PerRequest,
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    File,
    Stdout,
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub model_path: PathBuf,
    pub reload: ReloadPolicy,
    /// Base64 Ed25519 key; when set, unsigned artifacts are refused.
    pub model_public_key_b64: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models"),
            reload: ReloadPolicy::Once,
            model_public_key_b64: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("cardioscreen.log"),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `CardioscreenError::Validation` for unrecognized values.
    pub fn from_env() -> Result<Self, CardioscreenError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup` (the environment, or a map in tests).
    ///
    /// # Errors
    /// Returns `CardioscreenError::Validation` for unrecognized values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CardioscreenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(path) = get(MODEL_PATH_ENV) {
            settings.model_path = PathBuf::from(path);
        }

        if let Some(reload) = get(MODEL_RELOAD_ENV) {
            settings.reload = match reload.to_ascii_lowercase().as_str() {
                "once" => ReloadPolicy::Once,
                "per_request" | "per-request" => ReloadPolicy::PerRequest,
                other => {
                    return Err(CardioscreenError::Validation(format!(
                        "{MODEL_RELOAD_ENV} must be once or per_request (got {other:?})"
                    )))
                }
            };
        }

        settings.model_public_key_b64 = get(MODEL_PUBKEY_ENV);

        if let Some(mode) = get(LOG_MODE_ENV) {
            settings.log_mode = match mode.to_ascii_lowercase().as_str() {
                "file" => LogMode::File,
                "stdout" => LogMode::Stdout,
                "auto" => LogMode::Auto,
                other => {
                    return Err(CardioscreenError::Validation(format!(
                        "{LOG_MODE_ENV} must be file, stdout or auto (got {other:?})"
                    )))
                }
            };
        }

        if let Some(path) = get(LOG_FILE_ENV) {
            settings.log_file = PathBuf::from(path);
        }

        Ok(settings)
    }

    /// Artifact verification implied by the configured public key.
    ///
    /// # Errors
    /// Returns `CardioscreenError::ModelLoad` if the key is malformed.
    pub fn verification(&self) -> Result<Verification, CardioscreenError> {
        match &self.model_public_key_b64 {
            Some(b64) => Ok(Verification::from_public_key_b64(b64)?),
            None => Ok(Verification::Unsigned),
        }
    }
}
