//! Decision-forest plane classifier
//!
//! A model directory holds two JSON files:
//!
//! - `meta.json`: `{"labels": [...], "feature_names": [...], "n_features": 14}`
//! - `forest.json`: `{"trees": [{"nodes": [...]}, ...]}`
//!
//! Nodes are either `{"feature": i, "threshold": t, "left": l, "right": r}`
//! (go left when `x[i] <= t`) or `{"label": "wall"}`. Node 0 is the root and
//! children always come after their parent, so traversal terminates.

use crate::classifier::{FeatureVector, PlaneClassifier};
use crate::error::{ClassifyError, Result};
use crate::labels::PlaneLabel;
use roomscan_algorithms::{FEATURE_COUNT, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const META_FILE: &str = "meta.json";
pub const FOREST_FILE: &str = "forest.json";

/// Model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub labels: Vec<PlaneLabel>,
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub n_features: usize,
}

impl Default for ModelMeta {
    fn default() -> Self {
        Self {
            labels: PlaneLabel::ALL.to_vec(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            n_features: FEATURE_COUNT,
        }
    }
}

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        label: PlaneLabel,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check node references for a tree at position `tree` in the forest
    fn validate(&self, tree: usize, n_features: usize) -> Result<()> {
        let invalid = |message: String| ClassifyError::InvalidTree { tree, message };

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".to_string()));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature, left, right, ..
            } = *node
            {
                if feature >= n_features {
                    return Err(invalid(format!("node {index} splits on feature {feature}")));
                }
                for child in [left, right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(invalid(format!("node {index} has bad child {child}")));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. Requires a validated tree.
    fn predict(&self, row: &FeatureVector) -> PlaneLabel {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                TreeNode::Leaf { label } => return label,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forest {
    pub trees: Vec<DecisionTree>,
}

/// Majority vote over a forest of decision trees
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    meta: ModelMeta,
    forest: Forest,
}

impl TrainedClassifier {
    /// Build from parts, validating the forest against the metadata
    pub fn new(meta: ModelMeta, forest: Forest) -> Result<Self> {
        if meta.n_features != FEATURE_COUNT {
            return Err(ClassifyError::FeatureCount {
                expected: meta.n_features,
                actual: FEATURE_COUNT,
            });
        }
        if forest.trees.is_empty() {
            return Err(ClassifyError::EmptyModel("forest has no trees".to_string()));
        }
        for (index, tree) in forest.trees.iter().enumerate() {
            tree.validate(index, meta.n_features)?;
        }
        Ok(Self { meta, forest })
    }

    /// Load `meta.json` and `forest.json` from a model directory
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let meta: ModelMeta = serde_json::from_str(&fs::read_to_string(dir.join(META_FILE))?)?;
        let forest: Forest = serde_json::from_str(&fs::read_to_string(dir.join(FOREST_FILE))?)?;
        Self::new(meta, forest)
    }

    /// Write the model into `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(dir.join(META_FILE), serde_json::to_string_pretty(&self.meta)?)?;
        fs::write(dir.join(FOREST_FILE), serde_json::to_string(&self.forest)?)?;
        Ok(())
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn tree_count(&self) -> usize {
        self.forest.trees.len()
    }

    fn vote(&self, row: &FeatureVector) -> PlaneLabel {
        let mut votes = [0usize; PlaneLabel::ALL.len()];
        for tree in &self.forest.trees {
            votes[tree.predict(row).index()] += 1;
        }
        // Ties go to the label that comes first in PlaneLabel::ALL
        let mut best = PlaneLabel::Wall;
        for label in PlaneLabel::ALL {
            if votes[label.index()] > votes[best.index()] {
                best = label;
            }
        }
        best
    }
}

impl PlaneClassifier for TrainedClassifier {
    fn name(&self) -> &'static str {
        "decision_forest"
    }

    fn predict(&self, features: &[FeatureVector]) -> Result<Vec<PlaneLabel>> {
        Ok(features.iter().map(|row| self.vote(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stump on centroid height: low planes floor, high planes ceiling
    fn height_stump(threshold: f32) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 4,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    label: PlaneLabel::Floor,
                },
                TreeNode::Leaf {
                    label: PlaneLabel::Ceiling,
                },
            ],
        }
    }

    fn leaf(label: PlaneLabel) -> DecisionTree {
        DecisionTree {
            nodes: vec![TreeNode::Leaf { label }],
        }
    }

    fn row_at_height(y: f32) -> FeatureVector {
        let mut row = [0.0; FEATURE_COUNT];
        row[4] = y;
        row
    }

    #[test]
    fn test_majority_vote() {
        let forest = Forest {
            trees: vec![height_stump(1.0), height_stump(2.0), leaf(PlaneLabel::Wall)],
        };
        let model = TrainedClassifier::new(ModelMeta::default(), forest).unwrap();

        let labels = model
            .predict(&[row_at_height(0.0), row_at_height(1.5), row_at_height(2.5)])
            .unwrap();
        // At 1.5 m the stumps disagree and wall wins the three-way tie.
        assert_eq!(labels, vec![PlaneLabel::Floor, PlaneLabel::Wall, PlaneLabel::Ceiling]);
    }

    #[test]
    fn test_rejects_malformed_trees() {
        let out_of_range = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: FEATURE_COUNT,
                threshold: 0.0,
                left: 1,
                right: 2,
            }],
        };
        let cycle = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                leaf(PlaneLabel::Wall).nodes[0].clone(),
            ],
        };

        for tree in [out_of_range, cycle, DecisionTree { nodes: Vec::new() }] {
            let result = TrainedClassifier::new(ModelMeta::default(), Forest { trees: vec![tree] });
            assert!(matches!(result, Err(ClassifyError::InvalidTree { tree: 0, .. })));
        }
        assert!(matches!(
            TrainedClassifier::new(ModelMeta::default(), Forest::default()),
            Err(ClassifyError::EmptyModel(_))
        ));
    }

    #[test]
    fn test_rejects_feature_count_mismatch() {
        let meta = ModelMeta {
            n_features: 10,
            ..ModelMeta::default()
        };
        let forest = Forest {
            trees: vec![leaf(PlaneLabel::Wall)],
        };
        assert!(matches!(
            TrainedClassifier::new(meta, forest),
            Err(ClassifyError::FeatureCount { expected: 10, .. })
        ));
    }

    #[test]
    fn test_save_and_load_model_dir() {
        let dir = std::env::temp_dir().join(format!("roomscan-forest-{}", std::process::id()));
        let model = TrainedClassifier::new(
            ModelMeta::default(),
            Forest {
                trees: vec![height_stump(1.5)],
            },
        )
        .unwrap();
        model.save(&dir).unwrap();

        let loaded = TrainedClassifier::load(&dir).unwrap();
        assert_eq!(loaded.tree_count(), 1);
        assert_eq!(loaded.predict(&[row_at_height(2.0)]).unwrap(), vec![PlaneLabel::Ceiling]);

        let nodes = fs::read_to_string(dir.join(FOREST_FILE)).unwrap();
        assert!(nodes.contains(r#"{"label":"floor"}"#));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_dir_fails() {
        assert!(matches!(
            TrainedClassifier::load("/nonexistent/roomscan-model"),
            Err(ClassifyError::Io(_))
        ));
    }
}
