//! # Cropwise Core
//!
//! Core library for the Cropwise crop recommendation engine.
//!
//! This crate provides the building blocks every other crate shares:
//!
//! - [`Vector`] - Dense feature vector in training column order
//! - [`NamedVector`] - Column-labelled values with explicit [`NamedVector::reindex`]
//! - [`Coerced`] - Tagged outcome of coercing a loosely typed payload cell
//! - [`Classifier`] / [`MlpClassifier`] - Trained model seam and the JSON MLP
//! - [`rank`] / [`Recommendation`] - Top-k ranking of class scores
//!
//! ## Example
//!
//! ```rust
//! use cropwise_core::{rank, Classifier, DenseLayer, Activation, MlpClassifier, Vector};
//!
//! let model = MlpClassifier::new(vec![DenseLayer {
//!     weights: vec![vec![0.0, 0.0, 0.0]],
//!     bias: vec![0.7, 0.2, 0.1],
//!     activation: Activation::Linear,
//! }])
//! .unwrap();
//!
//! let scores = model.predict_scores(&Vector::new(vec![1.0])).unwrap();
//! let classes = vec!["Paddy".to_string(), "Maize".to_string(), "Cotton".to_string()];
//! let top = rank(&scores, &classes, 3).unwrap();
//! assert_eq!(top[0].crop, "Paddy");
//! ```

pub mod error;
pub mod vector;
pub mod named;
pub mod value;
pub mod model;
pub mod rank;

pub use error::{Error, Result};
pub use vector::Vector;
pub use named::NamedVector;
pub use value::{coerce_number, category_label, is_truthy, Coerced};
pub use model::{Activation, Classifier, DenseLayer, MlpClassifier};
pub use rank::{rank, round_score, Recommendation, DEFAULT_TOP_K, SCORE_DECIMALS};
