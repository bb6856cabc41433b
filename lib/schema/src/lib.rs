//! # Cropwise Schema
//!
//! Training-time schema and the feature-preparation pipeline.
//!
//! ## Overview
//!
//! A trained model only understands vectors laid out exactly as they were at
//! training time. This crate rebuilds that layout from the persisted training
//! artifacts and turns loosely typed request payloads into such vectors.
//!
//! **How it works:**
//! 1. [`SchemaCatalog`] reads the reference dataset and metadata once
//! 2. [`RowBuilder`] projects a payload onto the declared input columns
//! 3. [`NumericTransformer`] coerces numbers and fills gaps with [`KnnImputer`]
//! 4. [`CategoricalEncoder`] one-hot encodes against the drop-first template
//! 5. [`FeatureAssembler`] reindexes everything onto the trained feature order
//!
//! ## Example
//!
//! ```rust
//! use cropwise_schema::{ArtifactMetadata, CatalogOptions, ReferenceTable, SchemaCatalog};
//! use serde_json::json;
//!
//! let csv = "Soil_Type,Rainfall,Recommended_Crop\nBlack,850,Cotton\nRed,550,Maize\n";
//! let table = ReferenceTable::from_reader(csv.as_bytes()).unwrap();
//! let metadata = ArtifactMetadata {
//!     feature_columns: vec!["Rainfall".to_string(), "Soil_Type_Red".to_string()],
//!     classes: vec!["Cotton".to_string(), "Maize".to_string()],
//! };
//! let catalog = SchemaCatalog::build(table, metadata, &CatalogOptions::default()).unwrap();
//!
//! let payload = json!({"Soil_Type": "Red"});
//! let features = catalog.prepare(payload.as_object().unwrap()).unwrap();
//! assert_eq!(features.as_slice(), &[700.0, 1.0]);
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Payload   │────>│ RowBuilder  │────>│  Numeric    │──┐
//! │   (JSON)    │     │ (inputs)    │  │  │  (KNN fill) │  │
//! └─────────────┘     └─────────────┘  │  └─────────────┘  │  ┌─────────────┐
//!                                      │  ┌─────────────┐  ├─>│  Assembler  │
//!                                      └─>│ Categorical │──┘  │ (reindex)   │
//!                                         │ (one-hot)   │     └─────────────┘
//!                                         └─────────────┘
//! ```

pub mod dataset;
pub mod row;
pub mod numeric;
pub mod categorical;
pub mod assemble;
pub mod catalog;

// Re-export main types
pub use dataset::{ColumnKind, ReferenceTable, NA_VALUES};
pub use row::{InputRow, RowBuilder};
pub use numeric::{KnnImputer, NumericTransformer, DEFAULT_NEIGHBORS};
pub use categorical::{build_template, column_categories, indicator_name, CategoricalEncoder, UNKNOWN_CATEGORY};
pub use assemble::FeatureAssembler;
pub use catalog::{ArtifactMetadata, CatalogOptions, SchemaCatalog};
