//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the externally produced model.

mod classifier;
mod model_provider;

pub use classifier::Classifier;
pub use model_provider::ModelProvider;
