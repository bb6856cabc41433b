//! # Cropwise
//!
//! Crop recommendation service: turns a partial field observation into a
//! ranked list of crops using a trained classifier.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! cropwise --dataset apcrop_dataset.csv \
//!          --model croprecommender_mlp.json \
//!          --metadata croprecommender_meta.json \
//!          --http-port 5000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use cropwise::prelude::*;
//! use serde_json::json;
//!
//! let engine = Engine::new(EngineConfig {
//!     artifacts: ArtifactPaths::in_dir("./artifacts"),
//!     ..EngineConfig::default()
//! });
//!
//! let payload = json!({"District": "Guntur", "Soil_Type": "Black"});
//! let top = engine.predict(payload.as_object().unwrap()).unwrap();
//! for rec in top {
//!     println!("{}: {}", rec.crop, rec.score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `cropwise-core` - Vectors, payload coercion, the model and ranking
//! - `cropwise-schema` - Reference dataset, imputation, one-hot encoding
//! - `cropwise-engine` - Artifact loading and the engine state machine
//! - `cropwise-api` - REST API

// Re-export core types
pub use cropwise_core::{
    rank, Activation, Classifier, Coerced, DenseLayer, Error, MlpClassifier, NamedVector,
    Recommendation, Result, Vector,
};

// Re-export schema
pub use cropwise_schema::{ArtifactMetadata, CatalogOptions, ReferenceTable, SchemaCatalog};

// Re-export engine
pub use cropwise_engine::{ArtifactPaths, Engine, EngineConfig, EngineState};

// Re-export API
pub use cropwise_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ArtifactPaths, Classifier, Engine, EngineConfig, EngineState, Error, Recommendation,
        RestApi, Result, SchemaCatalog, Vector,
    };
}
