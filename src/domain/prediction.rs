//! Prediction result types.
//!
//! Represents the binary output of the heart disease classifier.

use serde::{Deserialize, Serialize};

/// Advisory shown with every verdict.
pub const ADVISORY_NOTE: &str = "This is a simplified model and may not be accurate for all cases. \
Please consult with a healthcare professional for a more accurate diagnosis.";

/// Binary heart disease verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    /// Label 0: no disease
    NotLikely,
    /// Label 1: disease present
    Likely,
}

impl Prediction {
    /// Normalize a raw classifier label.
    ///
    /// Zero means no disease; any other finite value is treated as positive.
    /// Returns `None` for NaN or infinite labels.
    #[must_use]
    pub fn from_raw_label(raw: f64) -> Option<Self> {
        if !raw.is_finite() {
            None
        } else if raw == 0.0 {
            Some(Self::NotLikely)
        } else {
            Some(Self::Likely)
        }
    }

    /// Integer label: 0 or 1.
    #[must_use]
    pub fn label(&self) -> u8 {
        match self {
            Self::NotLikely => 0,
            Self::Likely => 1,
        }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Likely)
    }

    /// Verdict sentence for display.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotLikely => "The patient is not likely to have heart disease.",
            Self::Likely => "The patient is likely to have heart disease.",
        }
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLikely => write!(f, "NOT LIKELY"),
            Self::Likely => write!(f, "LIKELY"),
        }
    }
}
