use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::entities::{PredictionFeatures, FEATURE_NAMES};
use crate::error::{model_unavailable_error, unexpected_error, Error};

/// A node of a fitted regression tree. Splits send a sample left when
/// `features[feature] <= threshold`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Clone, Debug, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn validate(&self, index: usize) -> Result<(), Error> {
        if self.nodes.is_empty() {
            return Err(model_unavailable_error(format!("tree {} has no nodes", index)));
        }

        for (position, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_NAMES.len() {
                        return Err(model_unavailable_error(format!(
                            "tree {} node {} splits on unknown feature {}",
                            index, position, feature
                        )));
                    }

                    if !threshold.is_finite() {
                        return Err(model_unavailable_error(format!(
                            "tree {} node {} has a non-finite threshold",
                            index, position
                        )));
                    }

                    // children always follow their parent, so a walk from the root terminates
                    for child in [left, right] {
                        if *child <= position || *child >= self.nodes.len() {
                            return Err(model_unavailable_error(format!(
                                "tree {} node {} points to invalid child {}",
                                index, position, child
                            )));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(model_unavailable_error(format!(
                            "tree {} node {} has a non-finite value",
                            index, position
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn predict(&self, x: &[f64; 6]) -> f64 {
        let mut position = 0;

        loop {
            match &self.nodes[position] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    position = if x[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { value } => return *value,
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct ModelFile {
    feature_names: Vec<String>,
    trees: Vec<Tree>,
}

/// Travel-time regressor: an averaged ensemble of regression trees loaded
/// from a JSON model file. Read-only once loaded.
#[derive(Clone, Debug)]
pub struct Predictor {
    trees: Vec<Tree>,
}

impl Predictor {
    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(path).map_err(|err| {
            model_unavailable_error(format!(
                "model file {} could not be read: {}",
                path.display(),
                err
            ))
        })?;

        let predictor = Self::from_json(&data)?;

        tracing::info!(trees = predictor.trees.len(), "loaded travel time model");

        Ok(predictor)
    }

    pub fn from_json(data: &str) -> Result<Self, Error> {
        let model: ModelFile = serde_json::from_str(data)
            .map_err(|err| model_unavailable_error(format!("invalid model file: {}", err)))?;

        if model.feature_names != FEATURE_NAMES {
            return Err(model_unavailable_error(format!(
                "model expects features {:?}, expected {:?}",
                model.feature_names, FEATURE_NAMES
            )));
        }

        if model.trees.is_empty() {
            return Err(model_unavailable_error("model contains no trees"));
        }

        for (index, tree) in model.trees.iter().enumerate() {
            tree.validate(index)?;
        }

        Ok(Self { trees: model.trees })
    }

    /// Predicted travel time in minutes.
    pub fn estimate(&self, features: &PredictionFeatures) -> Result<f64, Error> {
        let x = features.values();

        if x.iter().any(|v| !v.is_finite()) {
            return Err(unexpected_error("prediction features must be finite"));
        }

        let total: f64 = self.trees.iter().map(|tree| tree.predict(x)).sum();
        let minutes = total / self.trees.len() as f64;

        if !minutes.is_finite() {
            return Err(unexpected_error("model produced a non-finite estimate"));
        }

        Ok(minutes)
    }
}

#[cfg(test)]
pub(crate) const TEST_MODEL: &str = r#"{
    "feature_names": ["origin_lat", "origin_lon", "dest_lat", "dest_lon", "traffic_condition", "battery_level"],
    "trees": [
        { "nodes": [
            { "feature": 4, "threshold": 1.5, "left": 1, "right": 2 },
            { "value": 60.0 },
            { "value": 40.0 }
        ] },
        { "nodes": [
            { "feature": 5, "threshold": 65.0, "left": 1, "right": 2 },
            { "value": 60.0 },
            { "feature": 0, "threshold": 13.0, "left": 3, "right": 4 },
            { "value": 40.0 },
            { "value": 35.0 }
        ] },
        { "nodes": [
            { "value": 45.0 }
        ] }
    ]
}"#;

#[test]
fn estimate_averages_trees() {
    let predictor = Predictor::from_json(TEST_MODEL).unwrap();
    let features =
        PredictionFeatures([12.9716, 77.5946, 13.0827, 80.2707, 2.0, 80.0]);

    // 40 + 40 + 45
    let minutes = predictor.estimate(&features).unwrap();
    assert!((minutes - 125.0 / 3.0).abs() < 1e-9);
}

#[test]
fn estimate_is_deterministic() {
    let predictor = Predictor::from_json(TEST_MODEL).unwrap();
    let features = PredictionFeatures([12.2958, 76.6394, 12.9716, 77.5946, 1.0, 50.0]);

    let first = predictor.estimate(&features).unwrap();
    let second = predictor.estimate(&features).unwrap();

    assert_eq!(first.to_bits(), second.to_bits());
    assert_eq!(first, 55.0);
}

#[test]
fn split_threshold_is_inclusive_on_the_left() {
    let predictor = Predictor::from_json(TEST_MODEL).unwrap();
    let features = PredictionFeatures([13.0, 0.0, 0.0, 0.0, 3.0, 90.0]);

    // tree 2 goes left at exactly 13.0
    let minutes = predictor.estimate(&features).unwrap();
    assert_eq!(minutes, (40.0 + 40.0 + 45.0) / 3.0);
}

#[test]
fn missing_model_file_is_unavailable() {
    use crate::error::ErrorKind;

    let err = Predictor::load(Path::new("does/not/exist.json")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ModelUnavailable);
    assert!(err.is_startup_fatal());
}

#[test]
fn invalid_models_are_rejected() {
    let wrong_features = r#"{ "feature_names": ["a"], "trees": [{ "nodes": [{ "value": 1.0 }] }] }"#;
    assert!(Predictor::from_json(wrong_features).is_err());

    let no_trees = r#"{
        "feature_names": ["origin_lat", "origin_lon", "dest_lat", "dest_lon", "traffic_condition", "battery_level"],
        "trees": []
    }"#;
    assert!(Predictor::from_json(no_trees).is_err());

    let cyclic = r#"{
        "feature_names": ["origin_lat", "origin_lon", "dest_lat", "dest_lon", "traffic_condition", "battery_level"],
        "trees": [{ "nodes": [{ "feature": 0, "threshold": 1.0, "left": 0, "right": 1 }, { "value": 1.0 }] }]
    }"#;
    assert!(Predictor::from_json(cyclic).is_err());

    let bad_feature = r#"{
        "feature_names": ["origin_lat", "origin_lon", "dest_lat", "dest_lon", "traffic_condition", "battery_level"],
        "trees": [{ "nodes": [{ "feature": 6, "threshold": 1.0, "left": 1, "right": 2 }, { "value": 1.0 }, { "value": 2.0 }] }]
    }"#;
    assert!(Predictor::from_json(bad_feature).is_err());

    assert!(Predictor::from_json("not json").is_err());
}

#[test]
fn bundled_model_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/route_prediction_model.json");
    let predictor = Predictor::load(&path).unwrap();

    let features = PredictionFeatures([12.9716, 77.5946, 13.0827, 80.2707, 2.0, 80.0]);
    let minutes = predictor.estimate(&features).unwrap();
    assert!(minutes >= 35.0 && minutes <= 60.0);
}
