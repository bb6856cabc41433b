//! Classifier models
//!
//! The engine talks to its model through [`Classifier`]. The shipped
//! implementation is [`MlpClassifier`], a feed-forward network stored as JSON.
//! The layer layout follows Keras `Dense` layers: each layer holds an
//! `inputs × units` kernel, a bias per unit and an activation.
//!
//! ```json
//! {
//!   "layers": [
//!     { "weights": [[0.1, -0.2], [0.3, 0.4]], "bias": [0.0, 0.1], "activation": "relu" },
//!     { "weights": [[1.0, 0.0, 0.5], [0.0, 1.0, 0.5]], "bias": [0.0, 0.0, 0.0], "activation": "softmax" }
//!   ]
//! }
//! ```

use crate::{Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A trained model producing one score per class
pub trait Classifier: Send + Sync + Debug {
    /// Length of the feature vector the model was trained on
    fn input_dim(&self) -> usize;

    /// Number of scores produced by a forward pass
    fn output_dim(&self) -> usize;

    /// Forward pass for a single row.
    ///
    /// Features must be in training column order.
    fn predict_scores(&self, features: &Vector) -> Result<Vec<f32>>;
}

/// Activation applied to the output of a dense layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
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
    fn apply(self, values: &mut [f32]) {
        match self {
            Activation::Linear => {}
            Activation::Relu => values.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Sigmoid => values
                .iter_mut()
                .for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
            Activation::Tanh => values.iter_mut().for_each(|v| *v = v.tanh()),
            Activation::Softmax => softmax(values),
        }
    }
}

/// Numerically stable softmax, in place
fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        values.iter_mut().for_each(|v| *v /= sum);
    }
}

/// A fully connected layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseLayer {
    /// Kernel, `inputs × units`
    pub weights: Vec<Vec<f32>>,
    /// One bias per unit
    pub bias: Vec<f32>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    pub fn inputs(&self) -> usize {
        self.weights.len()
    }

    pub fn units(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &Vector) -> Vector {
        let mut out: Vec<f32> = (0..self.units())
            .map(|unit| self.bias[unit] + input.dot_column(&self.weights, unit))
            .collect();
        self.activation.apply(&mut out);
        Vector::new(out)
    }
}

/// Multilayer perceptron classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MlpClassifier {
    layers: Vec<DenseLayer>,
}

impl MlpClassifier {
    /// Build a classifier from layers, checking that their shapes chain
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self> {
        let model = Self { layers };
        model.validate()?;
        Ok(model)
    }

    /// Load a classifier from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::from_artifact_io(path, e))?;
        let reader = BufReader::new(file);
        let model: MlpClassifier = serde_json::from_reader(reader).map_err(|e| {
            Error::SchemaInvalid(format!("model {}: {}", path.display(), e))
        })?;
        model.validate()?;
        Ok(model)
    }

    /// Load a classifier from a JSON string
    pub fn try_from_json(model_str: &str) -> Result<Self> {
        let model: MlpClassifier = serde_json::from_str(model_str)
            .map_err(|e| Error::SchemaInvalid(format!("model: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::SchemaInvalid("model has no layers".to_string()));
        }

        let mut expected_inputs = self.layers[0].inputs();
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs() != expected_inputs {
                return Err(Error::SchemaInvalid(format!(
                    "layer {} expects {} inputs, previous layer produces {}",
                    i,
                    layer.inputs(),
                    expected_inputs
                )));
            }
            if let Some(row) = layer.weights.iter().find(|row| row.len() != layer.units()) {
                return Err(Error::SchemaInvalid(format!(
                    "layer {} kernel row has {} units, bias has {}",
                    i,
                    row.len(),
                    layer.units()
                )));
            }
            expected_inputs = layer.units();
        }
        Ok(())
    }
}

impl Classifier for MlpClassifier {
    fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::inputs)
    }

    fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::units)
    }

    fn predict_scores(&self, features: &Vector) -> Result<Vec<f32>> {
        let expected = self.input_dim();
        if features.dim() != expected {
            return Err(Error::InvalidDimension {
                expected,
                actual: features.dim(),
            });
        }

        let output = self
            .layers
            .iter()
            .fold(features.clone(), |input, layer| layer.forward(&input));
        Ok(output.into_inner())
    }
}
