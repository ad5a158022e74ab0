//! Prediction error types.

use thiserror::Error;

use super::model::ModelError;

/// Errors that can occur while turning a questionnaire into a prediction.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Required questionnaire items absent from the input, in canonical order.
    #[error("missing features: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    /// Items present but not coercible to a finite number.
    #[error("invalid feature values: {}", .0.join(", "))]
    InvalidFeatures(Vec<String>),

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

impl PredictionError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Model(_))
    }
}
