use serde::{Serialize, Serializer};

use super::model::Prediction;

/// Either a probability or the literal `"N/A"`; never a numeric stand-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    Score(f64),
    Unavailable,
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Score(p) => serializer.serialize_f64(*p),
            Self::Unavailable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: i64,
    #[serde(rename = "Confidence")]
    pub confidence: Confidence,
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        Self {
            prediction: p.label,
            confidence: p.confidence.map_or(Confidence::Unavailable, Confidence::Score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unavailable_confidence_serializes_as_na() {
        let body = PredictResponse::from(Prediction {
            label: 0,
            confidence: None,
        });
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            json!({ "prediction": 0, "Confidence": "N/A" })
        );
    }

    #[test]
    fn score_serializes_as_number() {
        let body = PredictResponse::from(Prediction {
            label: 1,
            confidence: Some(0.75),
        });
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            json!({ "prediction": 1, "Confidence": 0.75 })
        );
    }
}
