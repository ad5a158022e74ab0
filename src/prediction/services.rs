use serde_json::{Map, Value};
use tracing::debug;

use super::{
    error::PredictionError,
    features::FeatureVector,
    model::{Model, Prediction},
};

/// Validate the questionnaire, run the model, and report label plus
/// confidence. Nothing reaches the model unless every feature is present
/// and numeric.
pub fn predict(model: &Model, input: &Map<String, Value>) -> Result<Prediction, PredictionError> {
    let features = FeatureVector::from_map(input)?;
    let prediction = model.predict(&features)?;
    debug!(
        label = prediction.label,
        confidence = ?prediction.confidence,
        "prediction made"
    );
    Ok(prediction)
}
