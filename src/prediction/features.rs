//! The canonical questionnaire schema and the fixed-order vector the model
//! consumes.
//!
//! The model sees positions, not names: the order of [`FEATURE_NAMES`] must
//! match the order the classifier was trained on.

use serde_json::{Map, Value};

use super::error::PredictionError;

pub const FEATURE_COUNT: usize = 18;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Trouble wrapping up final details",
    "Difficulty getting things in order",
    "Problems remembering appointments",
    "Avoiding or delaying difficult tasks",
    "Fidgeting when sitting for long",
    "Feeling overly active",
    "Making careless mistakes",
    "Difficulty keeping attention",
    "Difficulty concentrating on speech",
    "Misplacing or losing things",
    "Distracted by activity or noise",
    "Leaving seat in meetings",
    "Feeling restless or fidgety",
    "Talking too much in social situations",
    "Finishing others' sentences",
    "Interrupting others",
    "Difficulty unwinding and relaxing",
    "Difficulty waiting turn",
];

/// One questionnaire, as numbers in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    #[cfg(test)]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Validate a name → value map and lay it out in canonical order.
    ///
    /// Presence is checked before types, so a request that is both
    /// incomplete and malformed reports the missing names. Unknown keys are
    /// ignored.
    pub fn from_map(input: &Map<String, Value>) -> Result<Self, PredictionError> {
        let missing: Vec<String> = FEATURE_NAMES
            .into_iter()
            .filter(|name| !input.contains_key(*name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PredictionError::MissingFeatures(missing));
        }

        let mut values = [0.0; FEATURE_COUNT];
        let mut invalid = Vec::new();
        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            match input.get(name).and_then(coerce) {
                Some(v) => *slot = v,
                None => invalid.push(name.to_string()),
            }
        }
        if !invalid.is_empty() {
            return Err(PredictionError::InvalidFeatures(invalid));
        }

        Ok(Self(values))
    }
}

/// Numbers as-is, booleans as 0/1, numeric strings parsed. Non-finite
/// results are rejected.
fn coerce(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}
