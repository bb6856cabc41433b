//! Schema catalog
//!
//! Everything frozen at training time that a prediction must match: the
//! feature-column order, class labels, the input columns and their typing,
//! the categorical template and the imputer's reference matrix. Built once
//! from the training artifacts and read-only afterwards.

use crate::assemble::FeatureAssembler;
use crate::categorical::{CategoricalEncoder, UNKNOWN_CATEGORY};
use crate::dataset::{ColumnKind, ReferenceTable};
use crate::numeric::{NumericTransformer, DEFAULT_NEIGHBORS};
use crate::row::{InputRow, RowBuilder};
use cropwise_core::{Error, Result, Vector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Column-level options applied when building a catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogOptions {
    /// Training label; must be present in the reference dataset
    pub label_column: String,
    /// Crop-identity input column that gets a default when not supplied
    pub placeholder_column: String,
    /// Default used when the placeholder column has no values in the dataset
    pub placeholder_fallback: String,
    /// Housekeeping columns removed before typing; the label is always removed
    pub exclude_columns: Vec<String>,
    /// Token for missing categorical values
    pub unknown_category: String,
    /// Neighbours averaged by the imputer
    pub n_neighbors: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            label_column: "Recommended_Crop".to_string(),
            placeholder_column: "Primary_Crop".to_string(),
            placeholder_fallback: "Paddy".to_string(),
            exclude_columns: Vec::new(),
            unknown_category: UNKNOWN_CATEGORY.to_string(),
            n_neighbors: DEFAULT_NEIGHBORS,
        }
    }
}

impl CatalogOptions {
    fn excluded(&self) -> Vec<String> {
        let mut excluded = self.exclude_columns.clone();
        if !excluded.contains(&self.label_column) {
            excluded.push(self.label_column.clone());
        }
        excluded
    }
}

/// Feature order and class labels saved next to the trained model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactMetadata {
    pub feature_columns: Vec<String>,
    pub classes: Vec<String>,
}

impl ArtifactMetadata {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::from_artifact_io(path, e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::SchemaInvalid(format!("metadata {}: {}", path.display(), e)))
    }
}

/// Frozen training schema and the pipeline stages built from it
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    classes: Vec<String>,
    categorical_columns: Vec<String>,
    rows: RowBuilder,
    numeric: NumericTransformer,
    categorical: CategoricalEncoder,
    assembler: FeatureAssembler,
}

impl SchemaCatalog {
    /// Read the reference dataset and metadata files and build the catalog
    pub fn load(dataset_path: &Path, metadata_path: &Path, options: &CatalogOptions) -> Result<Self> {
        let table = ReferenceTable::load(dataset_path)?;
        let metadata = ArtifactMetadata::load(metadata_path)?;
        Self::build(table, metadata, options)
    }

    /// Build from already parsed artifacts
    pub fn build(
        mut table: ReferenceTable,
        metadata: ArtifactMetadata,
        options: &CatalogOptions,
    ) -> Result<Self> {
        if !table.has_column(&options.label_column) {
            return Err(Error::SchemaInvalid(format!(
                "label column '{}' missing from reference dataset",
                options.label_column
            )));
        }
        if metadata.feature_columns.is_empty() {
            return Err(Error::SchemaInvalid("metadata lists no feature columns".to_string()));
        }
        if metadata.classes.is_empty() {
            warn!("metadata lists no classes; every prediction will be empty");
        }

        let placeholder_default = table
            .mode(&options.placeholder_column)
            .unwrap_or_else(|| options.placeholder_fallback.clone());

        table.drop_columns(&options.excluded());
        let input_columns = table.columns().to_vec();

        let mut numeric_columns = Vec::new();
        let mut categorical_columns = Vec::new();
        for column in input_columns.iter().filter(|c| **c != options.placeholder_column) {
            match table.column_kind(column) {
                Some(ColumnKind::Numeric) => numeric_columns.push(column.clone()),
                Some(ColumnKind::Categorical) => categorical_columns.push(column.clone()),
                Some(ColumnKind::Empty) => {
                    warn!(column = %column, "column has no reference values; ignored")
                }
                None => {}
            }
        }

        let numeric_reference = numeric_matrix(&table, &numeric_columns);
        let numeric = NumericTransformer::fit(
            numeric_columns,
            numeric_reference,
            options.n_neighbors,
        )?;
        let categorical = CategoricalEncoder::fit(
            &table,
            categorical_columns.clone(),
            &options.unknown_category,
        )?;

        info!(
            rows = table.len(),
            inputs = input_columns.len(),
            numeric = numeric.columns().len(),
            categorical = categorical_columns.len(),
            template = categorical.template().len(),
            features = metadata.feature_columns.len(),
            classes = metadata.classes.len(),
            "Schema catalog built"
        );

        Ok(Self {
            classes: metadata.classes,
            categorical_columns,
            rows: RowBuilder::new(input_columns, options.placeholder_column.clone(), placeholder_default),
            numeric,
            categorical,
            assembler: FeatureAssembler::new(metadata.feature_columns),
        })
    }

    pub fn feature_columns(&self) -> &[String] {
        self.assembler.feature_columns()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn input_columns(&self) -> &[String] {
        self.rows.input_columns()
    }

    pub fn numeric_columns(&self) -> &[String] {
        self.numeric.columns()
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    pub fn categorical_template_columns(&self) -> &[String] {
        self.categorical.template()
    }

    pub fn placeholder_default(&self) -> &str {
        self.rows.placeholder_default()
    }

    pub fn row_builder(&self) -> &RowBuilder {
        &self.rows
    }

    pub fn numeric(&self) -> &NumericTransformer {
        &self.numeric
    }

    pub fn categorical(&self) -> &CategoricalEncoder {
        &self.categorical
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    /// Project a payload onto the input columns
    pub fn build_row(&self, payload: &Map<String, Value>) -> InputRow {
        self.rows.build(payload)
    }

    /// Full feature preparation: row, numeric and categorical parts, assembly.
    ///
    /// The output always has `feature_columns().len()` entries in that order.
    pub fn prepare(&self, payload: &Map<String, Value>) -> Result<Vector> {
        let row = self.build_row(payload);
        let numeric = self.numeric.transform(&row)?;
        let categorical = self.categorical.transform(&row);
        Ok(self.assembler.assemble(numeric, categorical))
    }
}

fn numeric_matrix(table: &ReferenceTable, columns: &[String]) -> Vec<Vec<Option<f64>>> {
    let by_column: Vec<Vec<Option<f64>>> = columns
        .iter()
        .filter_map(|c| table.numeric_column(c))
        .collect();

    (0..table.len())
        .map(|row| by_column.iter().map(|col| col[row]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CSV: &str = "\
District,Season,Soil_Type,Soil_pH,Rainfall,Notes,Primary_Crop,Recommended_Crop
Guntur,Kharif,Black,7.8,850,,Cotton,Cotton
Krishna,Kharif,Alluvial,6.9,1020,,Paddy,Paddy
Krishna,Rabi,Alluvial,7.0,,,Paddy,Paddy
Anantapur,Kharif,Red,6.2,550,,Groundnut,Maize
";

    fn metadata() -> ArtifactMetadata {
        ArtifactMetadata {
            feature_columns: vec![
                "Soil_pH".to_string(),
                "Rainfall".to_string(),
                "Soil_Type_Black".to_string(),
                "Soil_Type_Red".to_string(),
                "Season_Rabi".to_string(),
            ],
            classes: vec!["Paddy".to_string(), "Maize".to_string(), "Cotton".to_string()],
        }
    }

    fn catalog() -> SchemaCatalog {
        let table = ReferenceTable::from_reader(CSV.as_bytes()).unwrap();
        SchemaCatalog::build(table, metadata(), &CatalogOptions::default()).unwrap()
    }

    #[test]
    fn test_columns_partitioned() {
        let c = catalog();
        assert_eq!(
            c.input_columns(),
            &["District", "Season", "Soil_Type", "Soil_pH", "Rainfall", "Notes", "Primary_Crop"]
        );
        assert_eq!(c.numeric_columns(), &["Soil_pH", "Rainfall"]);
        assert_eq!(c.categorical_columns(), &["District", "Season", "Soil_Type"]);
        assert!(c
            .numeric_columns()
            .iter()
            .all(|n| !c.categorical_columns().contains(n)));
    }

    #[test]
    fn test_template_and_placeholder() {
        let c = catalog();
        assert_eq!(
            c.categorical_template_columns(),
            &[
                "District_Guntur",
                "District_Krishna",
                "Season_Rabi",
                "Soil_Type_Black",
                "Soil_Type_Red",
            ]
        );
        assert_eq!(c.placeholder_default(), "Paddy");
    }

    #[test]
    fn test_placeholder_fallback_when_column_absent() {
        let table = ReferenceTable::from_reader("Soil_pH,Recommended_Crop\n6.5,Paddy\n".as_bytes()).unwrap();
        let c = SchemaCatalog::build(table, metadata(), &CatalogOptions::default()).unwrap();
        assert_eq!(c.placeholder_default(), "Paddy");

        let options = CatalogOptions {
            placeholder_fallback: "Millet".to_string(),
            ..CatalogOptions::default()
        };
        let table = ReferenceTable::from_reader("Soil_pH,Recommended_Crop\n6.5,Paddy\n".as_bytes()).unwrap();
        let c = SchemaCatalog::build(table, metadata(), &options).unwrap();
        assert_eq!(c.placeholder_default(), "Millet");
    }

    #[test]
    fn test_missing_label_column() {
        let table = ReferenceTable::from_reader("Soil_pH,Primary_Crop\n6.5,Paddy\n".as_bytes()).unwrap();
        let result = SchemaCatalog::build(table, metadata(), &CatalogOptions::default());
        assert!(matches!(result, Err(Error::SchemaInvalid(_))));
    }

    #[test]
    fn test_empty_feature_columns_rejected() {
        let table = ReferenceTable::from_reader(CSV.as_bytes()).unwrap();
        let metadata = ArtifactMetadata {
            feature_columns: vec![],
            classes: vec!["Paddy".to_string()],
        };
        let result = SchemaCatalog::build(table, metadata, &CatalogOptions::default());
        assert!(matches!(result, Err(Error::SchemaInvalid(_))));
    }

    #[test]
    fn test_prepare_matches_feature_order() {
        let c = catalog();
        let payload = json!({
            "District": "Guntur", "Season": "Rabi", "Soil_Type": "Red",
            "Soil_pH": 6.0, "Rainfall": "700"
        });
        let features = c.prepare(payload.as_object().unwrap()).unwrap();
        assert_eq!(features.as_slice(), &[6.0, 700.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_prepare_imputes_missing_numeric() {
        let c = catalog();
        let features = c.prepare(&Map::new()).unwrap();
        assert_eq!(features.dim(), c.feature_columns().len());
        // no present numeric cells, so both columns take their means
        assert!((features.as_slice()[0] - 6.975).abs() < 1e-4);
        assert!((features.as_slice()[1] - 806.6667).abs() < 1e-2);
    }

    #[test]
    fn test_excluded_columns_removed() {
        let options = CatalogOptions {
            exclude_columns: vec!["Notes".to_string(), "District".to_string()],
            ..CatalogOptions::default()
        };
        let table = ReferenceTable::from_reader(CSV.as_bytes()).unwrap();
        let c = SchemaCatalog::build(table, metadata(), &options).unwrap();
        assert!(!c.input_columns().iter().any(|col| col == "District" || col == "Notes"));
        assert!(!c.input_columns().iter().any(|col| col == "Recommended_Crop"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: CatalogOptions = serde_json::from_value(json!({"n_neighbors": 3})).unwrap();
        assert_eq!(options.n_neighbors, 3);
        assert_eq!(options.label_column, "Recommended_Crop");
    }
}
