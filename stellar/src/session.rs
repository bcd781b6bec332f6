//! Request-scoped classification context.
//!
//! A [`StarSession`] carries one set of inputs and a borrowed classifier
//! through derivation and inference. Nothing outlives the session.

use thiserror::Error;

use crate::classifier::{classify, ClassificationResult, ClassifierError, StellarClassifier};
use crate::photometry::{DerivedFeatures, IncompleteInputs, StellarInputs};

/// Why a classification request produced no result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteInputs),

    #[error("inference failed: {0}")]
    Inference(#[from] ClassifierError),
}

/// One classification request
pub struct StarSession<'a> {
    classifier: &'a dyn StellarClassifier,
    inputs: StellarInputs,
}

impl<'a> StarSession<'a> {
    pub fn new(classifier: &'a dyn StellarClassifier, inputs: StellarInputs) -> Self {
        Self { classifier, inputs }
    }

    pub fn inputs(&self) -> &StellarInputs {
        &self.inputs
    }

    pub fn derive(&self) -> DerivedFeatures {
        DerivedFeatures::derive(&self.inputs)
    }

    /// Derive features, check completeness, then run inference once
    pub fn classify(&self) -> Result<ClassificationResult, SessionError> {
        let derived = self.derive();
        log::debug!("Derived features: {derived:?}");

        let features = derived.feature_vector(&self.inputs)?;
        let result = classify(self.classifier, &features)?;

        log::info!(
            "Classified as {} ({:.2}%)",
            result.predicted_type,
            result.confidence
        );
        Ok(result)
    }
}
