//! Application layer: Use cases and services.
//!
//! Orchestrates the encoder with the classifier port.

mod configured;
mod predictor;

pub use configured::ConfiguredPredictor;
pub use predictor::Predictor;
