//! Classifier artifacts and the loaded, shareable model.
//!
//! An artifact is a JSON document tagged by `kind`. Whether the model can
//! report a confidence is decided once, when the artifact is loaded, and is
//! carried by the [`Model`] variant.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::features::{FeatureVector, FEATURE_COUNT};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Label inference. Implementations must be pure.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError>;
}

/// Label inference plus a per-class probability distribution.
pub trait ProbabilisticClassifier: Classifier {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError>;
}

/// A loaded classifier, read-only and shared by all requests.
pub enum Model {
    LabelOnly(Box<dyn Classifier>),
    WithConfidence(Box<dyn ProbabilisticClassifier>),
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("reports_confidence", &self.reports_confidence())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: i64,
    /// Highest class probability; `None` when the model cannot report one.
    pub confidence: Option<f64>,
}

impl Model {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)?;
        let kind = artifact.kind();
        let model = Self::from_artifact(artifact)?;
        info!(
            path = %path.display(),
            kind,
            reports_confidence = model.reports_confidence(),
            "model loaded"
        );
        Ok(model)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        match artifact {
            ModelArtifact::Adaboost(ensemble) => {
                ensemble.validate()?;
                Ok(Self::WithConfidence(Box::new(ensemble)))
            }
            ModelArtifact::Logistic(weights) => {
                weights.validate()?;
                Ok(Self::WithConfidence(Box::new(Logistic(weights))))
            }
            ModelArtifact::Linear(weights) => {
                weights.validate()?;
                Ok(Self::LabelOnly(Box::new(Linear(weights))))
            }
        }
    }

    pub fn reports_confidence(&self) -> bool {
        matches!(self, Self::WithConfidence(_))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ModelError> {
        match self {
            Self::LabelOnly(classifier) => Ok(Prediction {
                label: classifier.predict(features)?,
                confidence: None,
            }),
            Self::WithConfidence(classifier) => {
                let label = classifier.predict(features)?;
                let confidence = classifier
                    .predict_proba(features)?
                    .into_iter()
                    .reduce(f64::max)
                    .filter(|p| p.is_finite() && (0.0..=1.0).contains(p))
                    .ok_or_else(|| {
                        ModelError::Inference("probability output missing or out of range".into())
                    })?;
                Ok(Prediction {
                    label,
                    confidence: Some(confidence),
                })
            }
        }
    }
}

/// On-disk model description.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Discrete (SAMME) AdaBoost over decision stumps.
    Adaboost(AdaBoost),
    /// Logistic regression over the raw features.
    Logistic(LinearWeights),
    /// Linear decision function; no probabilities.
    Linear(LinearWeights),
}

impl ModelArtifact {
    fn kind(&self) -> &'static str {
        match self {
            Self::Adaboost(_) => "adaboost",
            Self::Logistic(_) => "logistic",
            Self::Linear(_) => "linear",
        }
    }
}

/// `features[feature] <= threshold` votes `left`, otherwise `right`.
#[derive(Debug, Clone, Deserialize)]
pub struct Stump {
    pub feature: usize,
    pub threshold: f64,
    pub left: i64,
    pub right: i64,
    pub weight: f64,
}

impl Stump {
    fn vote(&self, features: &FeatureVector) -> i64 {
        if features.as_slice()[self.feature] <= self.threshold {
            self.left
        } else {
            self.right
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdaBoost {
    pub classes: Vec<i64>,
    pub estimators: Vec<Stump>,
}

impl AdaBoost {
    fn validate(&self) -> Result<(), ModelError> {
        if self.classes.len() < 2 {
            return Err(ModelError::Invalid("adaboost needs at least two classes".into()));
        }
        if self.estimators.is_empty() {
            return Err(ModelError::Invalid("adaboost has no estimators".into()));
        }
        for (i, stump) in self.estimators.iter().enumerate() {
            if stump.feature >= FEATURE_COUNT {
                return Err(ModelError::Invalid(format!(
                    "estimator {i} reads feature {} of {FEATURE_COUNT}",
                    stump.feature
                )));
            }
            if !stump.threshold.is_finite() || !stump.weight.is_finite() || stump.weight < 0.0 {
                return Err(ModelError::Invalid(format!(
                    "estimator {i} has a non-finite threshold or invalid weight"
                )));
            }
            if !self.classes.contains(&stump.left) || !self.classes.contains(&stump.right) {
                return Err(ModelError::Invalid(format!(
                    "estimator {i} votes for an unknown class"
                )));
            }
        }
        Ok(())
    }

    /// Summed estimator weight per class, indexed like `classes`.
    fn votes(&self, features: &FeatureVector) -> Vec<f64> {
        let mut votes = vec![0.0; self.classes.len()];
        for stump in &self.estimators {
            let label = stump.vote(features);
            if let Some(i) = self.classes.iter().position(|c| *c == label) {
                votes[i] += stump.weight;
            }
        }
        votes
    }
}

impl Classifier for AdaBoost {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        let votes = self.votes(features);
        // ties go to the earlier class
        let (best, _) = votes
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            });
        self.classes
            .get(best)
            .copied()
            .ok_or_else(|| ModelError::Inference("no class selected".into()))
    }
}

impl ProbabilisticClassifier for AdaBoost {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let votes = self.votes(features);
        let total: f64 = self.estimators.iter().map(|s| s.weight).sum();
        let k = self.classes.len();
        if total <= 0.0 {
            return Ok(vec![1.0 / k as f64; k]);
        }
        let scale = total * (k - 1) as f64;
        Ok(softmax(votes.iter().map(|v| v / scale)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearWeights {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearWeights {
    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {FEATURE_COUNT} coefficients, found {}",
                self.coefficients.len()
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Invalid("non-finite coefficient".into()));
        }
        Ok(())
    }

    fn decision(&self, features: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

struct Logistic(LinearWeights);

impl Logistic {
    fn positive_probability(&self, features: &FeatureVector) -> f64 {
        1.0 / (1.0 + (-self.0.decision(features)).exp())
    }
}

impl Classifier for Logistic {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        Ok(i64::from(self.positive_probability(features) >= 0.5))
    }
}

impl ProbabilisticClassifier for Logistic {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let p = self.positive_probability(features);
        Ok(vec![1.0 - p, p])
    }
}

struct Linear(LinearWeights);

impl Classifier for Linear {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        Ok(i64::from(self.0.decision(features) > 0.0))
    }
}

fn softmax(scores: impl Iterator<Item = f64>) -> Vec<f64> {
    let scores: Vec<f64> = scores.collect();
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
