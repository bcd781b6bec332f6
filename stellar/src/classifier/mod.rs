//! Classifier adapter for pre-trained stellar type models.
//!
//! A model exposes a predicted label and a probability distribution over its
//! classes for one feature vector laid out in the model's own column order.
//! [`classify`] turns a [`FeatureVector`] into that layout, runs inference and
//! reports the winning class with its probability as a percentage.

pub mod forest;

use serde::Serialize;
use thiserror::Error;

use crate::photometry::{Feature, FeatureVector};

pub use forest::{ForestClassifier, ModelLoadError};

/// Errors raised during inference
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("model expects {expected} features, got {actual}")]
    FeatureArity { expected: usize, actual: usize },

    #[error("feature {index} is not finite")]
    NonFiniteFeature { index: usize },

    #[error("model produced an invalid probability distribution")]
    InvalidDistribution,
}

/// A pre-trained classifier over stellar features
pub trait StellarClassifier {
    /// Column order the model was trained with
    fn feature_schema(&self) -> &[Feature];

    /// Class labels, in the order of `predict_proba` output
    fn classes(&self) -> &[String];

    /// Probability of each class for one feature row
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError>;

    /// Most probable class label; ties go to the earliest class
    fn predict(&self, features: &[f64]) -> Result<String, ClassifierError> {
        let probabilities = self.predict_proba(features)?;
        let best = argmax(&probabilities).ok_or(ClassifierError::InvalidDistribution)?;
        self.classes()
            .get(best)
            .cloned()
            .ok_or(ClassifierError::InvalidDistribution)
    }
}

fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ if v.is_nan() => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Probability assigned to one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub label: String,
    pub probability: f64,
}

/// Outcome of one inference call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Predicted stellar type
    pub predicted_type: String,
    /// Probability of the predicted type, in percent
    pub confidence: f64,
    /// Full distribution over the model's classes
    pub probabilities: Vec<ClassProbability>,
}

/// Run one inference for a complete feature vector
pub fn classify(
    classifier: &dyn StellarClassifier,
    features: &FeatureVector,
) -> Result<ClassificationResult, ClassifierError> {
    let row = features.ordered(classifier.feature_schema());
    log::debug!("Classifier input {:?} = {:?}", classifier.feature_schema(), row);

    let probabilities = classifier.predict_proba(&row)?;
    let best = argmax(&probabilities).ok_or(ClassifierError::InvalidDistribution)?;
    let predicted_type = classifier
        .classes()
        .get(best)
        .cloned()
        .ok_or(ClassifierError::InvalidDistribution)?;

    let max_probability = probabilities[best];
    if !(0.0..=1.0).contains(&max_probability) {
        return Err(ClassifierError::InvalidDistribution);
    }

    let probabilities = classifier
        .classes()
        .iter()
        .zip(probabilities)
        .map(|(label, probability)| ClassProbability {
            label: label.clone(),
            probability,
        })
        .collect();

    Ok(ClassificationResult {
        predicted_type,
        confidence: max_probability * 100.0,
        probabilities,
    })
}
