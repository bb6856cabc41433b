//! Feature assembly
//!
//! Joins the numeric and categorical parts and reshapes them onto the trained
//! feature-column order. The model has no way to detect a reordered vector, so
//! [`FeatureAssembler::assemble`] is the only place a model input is built.

use cropwise_core::{NamedVector, Vector};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    feature_columns: Vec<String>,
}

impl FeatureAssembler {
    pub fn new(feature_columns: Vec<String>) -> Self {
        Self { feature_columns }
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn dim(&self) -> usize {
        self.feature_columns.len()
    }

    /// Numeric columns first, then template columns, reindexed onto the
    /// feature columns (missing names are 0, extra names are dropped)
    pub fn assemble(&self, numeric: NamedVector, categorical: NamedVector) -> Vector {
        let combined = numeric.concat(categorical);

        let dropped = combined.dropped_by(&self.feature_columns);
        if !dropped.is_empty() {
            debug!(?dropped, "columns not in the trained feature set");
        }

        combined.reindex(&self.feature_columns).into_vector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, f32)]) -> NamedVector {
        let mut v = NamedVector::empty();
        for (name, value) in pairs {
            v.push(*name, *value);
        }
        v
    }

    fn assembler() -> FeatureAssembler {
        FeatureAssembler::new(
            ["Soil_Type_Black", "Rainfall", "Legacy_Flag", "Soil_pH"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_output_in_feature_order() {
        let out = assembler().assemble(
            named(&[("Soil_pH", 6.5), ("Rainfall", 900.0)]),
            named(&[("Soil_Type_Black", 1.0)]),
        );
        assert_eq!(out.as_slice(), &[1.0, 900.0, 0.0, 6.5]);
    }

    #[test]
    fn test_extras_dropped_and_length_fixed() {
        let out = assembler().assemble(
            named(&[("Soil_pH", 6.5)]),
            named(&[("District_Guntur", 1.0), ("Season_Rabi", 1.0)]),
        );
        assert_eq!(out.dim(), 4);
        assert_eq!(out.as_slice(), &[0.0, 0.0, 0.0, 6.5]);
    }

    #[test]
    fn test_empty_parts() {
        let out = assembler().assemble(NamedVector::empty(), NamedVector::empty());
        assert_eq!(out, Vector::zeros(4));
    }
}
