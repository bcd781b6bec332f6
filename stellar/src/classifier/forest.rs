//! Tree-ensemble classifier loaded from a JSON model artifact.
//!
//! The artifact is exported by the training pipeline and looks like:
//!
//! ```json
//! {
//!   "feature_names": ["bv", "temperature", "luminosity", "radius", "magnitude", "age"],
//!   "classes": ["Main Sequence", "Giant"],
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 3, "threshold": 5.0, "left": 1, "right": 2 },
//!         { "value": [9.0, 1.0] },
//!         { "value": [1.0, 9.0] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Node 0 is the root. A split sends a row left when
//! `row[feature] <= threshold`. Leaf values are per-class weights (sample
//! counts or fractions) and are normalized before averaging across trees,
//! matching scikit-learn's random forest `predict_proba`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ClassifierError, StellarClassifier};
use crate::photometry::Feature;

/// Errors raised while loading or validating a model artifact
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown feature name '{0}'")]
    UnknownFeature(String),

    #[error("feature '{0}' listed more than once")]
    DuplicateFeature(Feature),

    #[error("model has no classes")]
    NoClasses,

    #[error("model has no trees")]
    NoTrees,

    #[error("tree {tree} has no nodes")]
    EmptyTree { tree: usize },

    #[error("tree {tree} node {node}: leaf has {actual} values, expected {expected}")]
    LeafArity {
        tree: usize,
        node: usize,
        expected: usize,
        actual: usize,
    },

    #[error("tree {tree} node {node}: leaf weights must be finite, non-negative and not all zero")]
    InvalidLeaf { tree: usize, node: usize },

    #[error("tree {tree} node {node}: feature index {feature} out of range")]
    FeatureOutOfRange {
        tree: usize,
        node: usize,
        feature: usize,
    },

    #[error("tree {tree} node {node}: threshold is not finite")]
    InvalidThreshold { tree: usize, node: usize },

    #[error("tree {tree} node {node}: child {child} out of range")]
    ChildOutOfRange {
        tree: usize,
        node: usize,
        child: usize,
    },

    #[error("tree {tree}: node {node} is reachable more than once")]
    NotATree { tree: usize, node: usize },
}

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// A single decision tree stored as a flat node array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to the leaf for a row
    ///
    /// Trees are validated on load, so every walk ends at a leaf.
    fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn validate(&self, tree: usize, n_features: usize, n_classes: usize) -> Result<(), ModelLoadError> {
        if self.nodes.is_empty() {
            return Err(ModelLoadError::EmptyTree { tree });
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![0usize];

        while let Some(node) = stack.pop() {
            if visited[node] {
                return Err(ModelLoadError::NotATree { tree, node });
            }
            visited[node] = true;

            match &self.nodes[node] {
                Node::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(ModelLoadError::LeafArity {
                            tree,
                            node,
                            expected: n_classes,
                            actual: value.len(),
                        });
                    }
                    let valid = value.iter().all(|w| w.is_finite() && *w >= 0.0)
                        && value.iter().sum::<f64>() > 0.0;
                    if !valid {
                        return Err(ModelLoadError::InvalidLeaf { tree, node });
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(ModelLoadError::FeatureOutOfRange {
                            tree,
                            node,
                            feature: *feature,
                        });
                    }
                    if !threshold.is_finite() {
                        return Err(ModelLoadError::InvalidThreshold { tree, node });
                    }
                    for child in [*left, *right] {
                        if child >= self.nodes.len() {
                            return Err(ModelLoadError::ChildOutOfRange { tree, node, child });
                        }
                        stack.push(child);
                    }
                }
            }
        }

        Ok(())
    }
}

/// On-disk layout of a model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub trees: Vec<Tree>,
}

/// A validated tree ensemble
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    schema: Vec<Feature>,
    classes: Vec<String>,
    trees: Vec<Tree>,
}

impl ForestClassifier {
    /// Validate an artifact and build the classifier
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelLoadError> {
        let mut schema = Vec::with_capacity(artifact.feature_names.len());
        for name in &artifact.feature_names {
            let feature = Feature::from_str(name.trim())
                .map_err(|_| ModelLoadError::UnknownFeature(name.clone()))?;
            if schema.contains(&feature) {
                return Err(ModelLoadError::DuplicateFeature(feature));
            }
            schema.push(feature);
        }

        if artifact.classes.is_empty() {
            return Err(ModelLoadError::NoClasses);
        }
        if artifact.trees.is_empty() {
            return Err(ModelLoadError::NoTrees);
        }

        for (index, tree) in artifact.trees.iter().enumerate() {
            tree.validate(index, schema.len(), artifact.classes.len())?;
        }

        Ok(Self {
            schema,
            classes: artifact.classes,
            trees: artifact.trees,
        })
    }

    /// Parse and validate a JSON artifact
    pub fn from_json(json: &str) -> Result<Self, ModelLoadError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// Load a JSON artifact from disk
    pub fn load_from_file(path: &Path) -> Result<Self, ModelLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&json)?;

        log::info!(
            "Loaded model from '{}': {} trees, {} classes, features {:?}",
            path.display(),
            model.trees.len(),
            model.classes.len(),
            model.schema.iter().map(|f| f.to_string()).collect::<Vec<_>>()
        );

        Ok(model)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl StellarClassifier for ForestClassifier {
    fn feature_schema(&self) -> &[Feature] {
        &self.schema
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        if features.len() != self.schema.len() {
            return Err(ClassifierError::FeatureArity {
                expected: self.schema.len(),
                actual: features.len(),
            });
        }
        if let Some(index) = features.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteFeature { index });
        }

        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf(features);
            let sum: f64 = leaf.iter().sum();
            for (total, weight) in totals.iter_mut().zip(leaf) {
                *total += weight / sum;
            }
        }

        let n = self.trees.len() as f64;
        Ok(totals.into_iter().map(|t| t / n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stump(feature: usize, threshold: f64) -> Tree {
        Tree {
            nodes: vec![
                Node::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                Node::Leaf {
                    value: vec![3.0, 1.0],
                },
                Node::Leaf {
                    value: vec![0.0, 2.0],
                },
            ],
        }
    }

    fn artifact(trees: Vec<Tree>) -> ModelArtifact {
        ModelArtifact {
            feature_names: vec!["bv".into(), "radius".into()],
            classes: vec!["Dwarf".into(), "Giant".into()],
            trees,
        }
    }

    #[test]
    fn test_single_tree_probabilities() {
        let model = ForestClassifier::from_artifact(artifact(vec![stump(1, 5.0)])).unwrap();

        let small = model.predict_proba(&[0.6, 1.0]).unwrap();
        assert_relative_eq!(small[0], 0.75);
        assert_relative_eq!(small[1], 0.25);
        assert_eq!(model.predict(&[0.6, 1.0]).unwrap(), "Dwarf");

        // Threshold is inclusive on the left
        assert_eq!(model.predict_proba(&[0.6, 5.0]).unwrap(), small);

        assert_eq!(model.predict(&[0.6, 50.0]).unwrap(), "Giant");
    }

    #[test]
    fn test_forest_averages_trees() {
        let model =
            ForestClassifier::from_artifact(artifact(vec![stump(1, 5.0), stump(0, 0.0)])).unwrap();

        // First tree: left [0.75, 0.25]; second tree: right [0, 1]
        let proba = model.predict_proba(&[0.6, 1.0]).unwrap();
        assert_relative_eq!(proba[0], 0.375);
        assert_relative_eq!(proba[1], 0.625);
        assert_relative_eq!(proba.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn test_rejects_wrong_arity_and_nan() {
        let model = ForestClassifier::from_artifact(artifact(vec![stump(1, 5.0)])).unwrap();
        assert_eq!(
            model.predict_proba(&[1.0]),
            Err(ClassifierError::FeatureArity {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            model.predict_proba(&[1.0, f64::NAN]),
            Err(ClassifierError::NonFiniteFeature { index: 1 })
        );
    }

    #[test]
    fn test_load_validation() {
        let mut bad = artifact(vec![stump(2, 5.0)]);
        assert!(matches!(
            ForestClassifier::from_artifact(bad.clone()),
            Err(ModelLoadError::FeatureOutOfRange { feature: 2, .. })
        ));

        bad.trees = vec![Tree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
        }];
        assert!(matches!(
            ForestClassifier::from_artifact(bad.clone()),
            Err(ModelLoadError::NotATree { .. })
        ));

        bad.trees = vec![Tree {
            nodes: vec![Node::Leaf { value: vec![1.0] }],
        }];
        assert!(matches!(
            ForestClassifier::from_artifact(bad.clone()),
            Err(ModelLoadError::LeafArity { expected: 2, .. })
        ));

        bad.trees = vec![Tree {
            nodes: vec![Node::Leaf {
                value: vec![0.0, 0.0],
            }],
        }];
        assert!(matches!(
            ForestClassifier::from_artifact(bad.clone()),
            Err(ModelLoadError::InvalidLeaf { .. })
        ));

        bad.trees = vec![];
        assert!(matches!(
            ForestClassifier::from_artifact(bad),
            Err(ModelLoadError::NoTrees)
        ));
    }

    #[test]
    fn test_feature_names_checked() {
        let mut a = artifact(vec![stump(0, 0.0)]);
        a.feature_names = vec!["bv".into(), "mass".into()];
        assert!(matches!(
            ForestClassifier::from_artifact(a.clone()),
            Err(ModelLoadError::UnknownFeature(name)) if name == "mass"
        ));

        a.feature_names = vec!["bv".into(), "b-v".into()];
        assert!(matches!(
            ForestClassifier::from_artifact(a),
            Err(ModelLoadError::DuplicateFeature(Feature::Bv))
        ));
    }

    #[test]
    fn test_json_round_trip_shape() {
        let json = r#"{
            "feature_names": ["bv", "radius"],
            "classes": ["Dwarf", "Giant"],
            "trees": [{ "nodes": [
                { "feature": 1, "threshold": 5.0, "left": 1, "right": 2 },
                { "value": [3, 1] },
                { "value": [0, 2] }
            ] }]
        }"#;

        let model = ForestClassifier::from_json(json).unwrap();
        assert_eq!(model.n_trees(), 1);
        assert_eq!(model.feature_schema(), &[Feature::Bv, Feature::Radius]);
        assert_eq!(model.predict(&[0.0, 10.0]).unwrap(), "Giant");
    }

    #[test]
    fn test_missing_file() {
        let err = ForestClassifier::load_from_file(Path::new("/nonexistent/model.json"))
            .unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }
}
