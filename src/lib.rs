//! # Cardioscreen
//!
//! Heart disease risk screening from thirteen clinical measurements.
//!
//! This crate provides:
//! - Label encoding of clinical records into classifier feature vectors
//! - Inference against a pre-trained, optionally signed, model artifact
//! - Terminal intake form for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (ClinicalRecord, FeatureVector, Prediction) and the encoder
//! - `ports`: Trait definitions for the classifier and its provider
//! - `adapters`: Model artifact loading, model providers, log sanitization
//! - `application`: The predictor use case
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{encode, ClinicalRecord, FeatureVector, Prediction};

/// Result type for Cardioscreen operations
pub type Result<T> = std::result::Result<T, CardioscreenError>;

/// Main error type for Cardioscreen
#[derive(Debug, thiserror::Error)]
pub enum CardioscreenError {
    #[error("Encoding failed: {0}")]
    Encoding(#[from] domain::EncodingError),

    #[error("Model could not be loaded: {0}")]
    ModelLoad(#[from] domain::ModelLoadError),

    #[error("Feature vector has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Model produced an unusable output: {0}")]
    InvalidOutput(String),

    #[error("Invalid clinical record: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
