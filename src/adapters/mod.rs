//! Adapters layer: Concrete implementations of ports.
//!
//! - `artifact`: model artifact loading, signature verification, logistic regression
//! - `provider`: resident and reloading model providers
//! - `sanitize`: clinical value filtering for logs

pub mod artifact;
pub mod provider;
pub mod sanitize;
