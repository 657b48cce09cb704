//! Inference artifact loading and evaluation.
//!
//! The trained classifier ships as a JSON document describing a small
//! feed-forward network:
//!
//! ```json
//! {
//!   "labels": ["General Malaise", "..."],
//!   "layers": [
//!     { "weights": [[0.1, 0.2, "..."]], "bias": [0.0], "activation": "relu" },
//!     { "weights": [["..."]], "bias": ["..."], "activation": "softmax" }
//!   ]
//! }
//! ```
//!
//! `weights` is row-major with one row per output unit. The network must
//! accept the 11-value feature vector and emit one value per diagnosis
//! label.

use std::path::PathBuf;
use std::time::Duration;

use ndarray::{Array1, Array2};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use super::data::FEATURE_COUNT;
use crate::error::{ModelError, ModelResult};
use crate::models::DiagnosisLabel;

/// Something that turns a feature vector into class probabilities.
#[cfg_attr(test, mockall::automock)]
pub trait InferenceBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> String;

    /// Run one forward pass over a single feature vector
    fn predict(&self, features: &[f32]) -> ModelResult<Vec<f32>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
}

impl Activation {
    fn apply(&self, values: &mut Array1<f32>) {
        match self {
            Activation::Linear => {}
            Activation::Relu => values.mapv_inplace(|v| v.max(0.0)),
            Activation::Sigmoid => values.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
            Activation::Tanh => values.mapv_inplace(f32::tanh),
            Activation::Softmax => {
                let max = values.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
                values.mapv_inplace(|v| (v - max).exp());
                let sum = values.sum();
                if sum > 0.0 {
                    values.mapv_inplace(|v| v / sum);
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactDocument {
    #[serde(default)]
    labels: Option<Vec<String>>,
    layers: Vec<LayerSpec>,
}

#[derive(Debug, Deserialize)]
struct LayerSpec {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    #[serde(default)]
    activation: Activation,
}

/// One fully connected layer: `activation(weights · x + bias)`.
#[derive(Debug, Clone)]
pub struct DenseLayer {
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

impl DenseLayer {
    pub fn new(weights: Array2<f32>, bias: Array1<f32>, activation: Activation) -> ModelResult<Self> {
        if weights.nrows() != bias.len() {
            return Err(ModelError::architecture(format!(
                "layer has {} output rows but {} bias values",
                weights.nrows(),
                bias.len()
            )));
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    fn forward(&self, input: &Array1<f32>) -> Array1<f32> {
        let mut out = self.weights.dot(input) + &self.bias;
        self.activation.apply(&mut out);
        out
    }

    fn from_spec(index: usize, spec: LayerSpec) -> ModelResult<Self> {
        let rows = spec.weights.len();
        let cols = spec.weights.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(ModelError::architecture(format!("layer {} has no weights", index)));
        }
        if spec.weights.iter().any(|row| row.len() != cols) {
            return Err(ModelError::architecture(format!(
                "layer {} has ragged weight rows",
                index
            )));
        }

        let flat: Vec<f32> = spec.weights.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| ModelError::architecture(format!("layer {}: {}", index, e)))?;
        Self::new(weights, Array1::from(spec.bias), spec.activation)
    }
}

/// Feed-forward classifier over the triage feature vector.
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Builds a network and checks it fits the feature and label contract.
    pub fn from_layers(layers: Vec<DenseLayer>) -> ModelResult<Self> {
        let first = layers
            .first()
            .ok_or_else(|| ModelError::architecture("model has no layers"))?;
        if first.input_size() != FEATURE_COUNT {
            return Err(ModelError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: first.input_size(),
            });
        }
        for (idx, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(ModelError::architecture(format!(
                    "layer {} emits {} values but layer {} expects {}",
                    idx,
                    pair[0].output_size(),
                    idx + 1,
                    pair[1].input_size()
                )));
            }
        }
        let outputs = layers.last().map(DenseLayer::output_size).unwrap_or(0);
        if outputs != DiagnosisLabel::NUM_CLASSES {
            return Err(ModelError::ShapeMismatch {
                expected: DiagnosisLabel::NUM_CLASSES,
                actual: outputs,
            });
        }
        Ok(Self { layers })
    }

    /// Parses an artifact document.
    pub fn from_json(bytes: &[u8]) -> ModelResult<Self> {
        let doc: ArtifactDocument = serde_json::from_slice(bytes)?;

        if let Some(labels) = doc.labels {
            let expected = DiagnosisLabel::ALL.iter().map(DiagnosisLabel::as_str);
            if !labels.iter().map(String::as_str).eq(expected) {
                return Err(ModelError::LabelMismatch { found: labels });
            }
        }

        let layers = doc
            .layers
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| DenseLayer::from_spec(idx, spec))
            .collect::<ModelResult<Vec<_>>>()?;
        Self::from_layers(layers)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}

impl InferenceBackend for DenseNetwork {
    fn name(&self) -> String {
        format!("dense-{}", self.layers.len())
    }

    fn predict(&self, features: &[f32]) -> ModelResult<Vec<f32>> {
        if features.len() != FEATURE_COUNT {
            return Err(ModelError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }
        let mut activations = Array1::from(features.to_vec());
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        Ok(activations.to_vec())
    }
}

/// Where an artifact lives: an http(s) URL or a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelLocation {
    Remote(Url),
    Local(PathBuf),
}

impl ModelLocation {
    pub fn parse(uri: &str) -> ModelResult<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(ModelError::InvalidLocation("empty model location".into()));
        }
        match Url::parse(uri) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(ModelLocation::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(ModelLocation::Local)
                    .map_err(|_| ModelError::InvalidLocation(uri.to_string())),
                other => Err(ModelError::InvalidLocation(format!(
                    "unsupported scheme '{}' in {}",
                    other, uri
                ))),
            },
            // Relative paths have no scheme
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(ModelLocation::Local(PathBuf::from(uri))),
            Err(e) => Err(ModelError::InvalidLocation(format!("{}: {}", uri, e))),
        }
    }

    async fn read(&self, timeout: Duration) -> ModelResult<Vec<u8>> {
        match self {
            ModelLocation::Remote(url) => {
                let client = reqwest::Client::builder().timeout(timeout).build()?;
                let response = client.get(url.clone()).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            ModelLocation::Local(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

/// Fetches and parses an artifact from `uri`.
#[instrument(skip(timeout))]
pub async fn load_artifact(uri: &str, timeout: Duration) -> ModelResult<DenseNetwork> {
    let location = ModelLocation::parse(uri)?;
    debug!(?location, "reading model artifact");

    let bytes = location.read(timeout).await?;
    let network = DenseNetwork::from_json(&bytes)?;

    info!(layers = network.num_layers(), "model artifact parsed");
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use serde_json::json;

    fn identity_network() -> serde_json::Value {
        // Copies the first six features through and normalises them.
        let weights: Vec<Vec<f32>> = (0..6)
            .map(|row| (0..11).map(|col| if row == col { 1.0 } else { 0.0 }).collect())
            .collect();
        let bias = vec![0.0f32; 6];
        json!({
            "layers": [
                { "weights": weights, "bias": bias, "activation": "softmax" }
            ]
        })
    }

    #[test]
    fn softmax_output_sums_to_one() {
        let bytes = serde_json::to_vec(&identity_network()).unwrap();
        let network = DenseNetwork::from_json(&bytes).unwrap();

        let probs = network.predict(&[1.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(probs.len(), 6);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        let argmax = probs
            .iter()
            .enumerate()
            .fold(0, |best, (i, &p)| if p > probs[best] { i } else { best });
        assert_eq!(argmax, 1);
    }

    #[test]
    fn relu_then_linear_layers_chain() {
        let hidden = DenseLayer::new(
            Array2::from_elem((2, 11), 1.0),
            Array1::from(vec![-5.0, 0.0]),
            Activation::Relu,
        )
        .unwrap();
        let output = DenseLayer::new(
            arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]),
            Array1::zeros(6),
            Activation::Linear,
        )
        .unwrap();
        let network = DenseNetwork::from_layers(vec![hidden, output]).unwrap();

        // sum of inputs is 3: hidden = [relu(-2), relu(3)] = [0, 3]
        let mut features = [0.0; 11];
        features[0] = 3.0;
        let out = network.predict(&features).unwrap();
        assert_eq!(out, vec![0.0, 3.0, 3.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_wrong_input_width() {
        let layer = DenseLayer::new(Array2::zeros((6, 10)), Array1::zeros(6), Activation::Linear).unwrap();
        let err = DenseNetwork::from_layers(vec![layer]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 11, actual: 10 }));
    }

    #[test]
    fn rejects_wrong_class_count() {
        let layer = DenseLayer::new(Array2::zeros((5, 11)), Array1::zeros(5), Activation::Linear).unwrap();
        let err = DenseNetwork::from_layers(vec![layer]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 6, actual: 5 }));
    }

    #[test]
    fn rejects_bias_mismatch() {
        let err = DenseLayer::new(Array2::zeros((6, 11)), Array1::zeros(4), Activation::Linear).unwrap_err();
        assert!(matches!(err, ModelError::Architecture(_)));
    }

    #[test]
    fn rejects_ragged_rows() {
        let doc = json!({ "layers": [ { "weights": [[1.0, 2.0], [1.0]], "bias": [0.0, 0.0] } ] });
        let err = DenseNetwork::from_json(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
        assert!(matches!(err, ModelError::Architecture(_)));
    }

    #[test]
    fn rejects_reordered_labels() {
        let mut doc = identity_network();
        doc["labels"] = json!([
            "Chest Pain - Non-Cardiac",
            "General Malaise",
            "Cardiac Event (Possible)",
            "Acute Coronary Syndrome (Suspected)",
            "Respiratory Distress",
            "Febrile Illness"
        ]);
        let err = DenseNetwork::from_json(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
        assert!(matches!(err, ModelError::LabelMismatch { .. }));
    }

    #[test]
    fn predict_checks_feature_count() {
        let network = DenseNetwork::from_json(&serde_json::to_vec(&identity_network()).unwrap()).unwrap();
        let err = network.predict(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { expected: 11, actual: 2 }));
    }

    #[test]
    fn location_parsing() {
        assert!(matches!(
            ModelLocation::parse("https://models.example.org/triage/model.json").unwrap(),
            ModelLocation::Remote(_)
        ));
        assert_eq!(
            ModelLocation::parse("model/model.json").unwrap(),
            ModelLocation::Local(PathBuf::from("model/model.json"))
        );
        assert!(matches!(
            ModelLocation::parse("ftp://example.org/model.json"),
            Err(ModelError::InvalidLocation(_))
        ));
        assert!(matches!(ModelLocation::parse("  "), Err(ModelError::InvalidLocation(_))));
    }
}
