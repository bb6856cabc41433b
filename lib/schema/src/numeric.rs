//! Numeric transformation
//!
//! Coerces numeric cells and fills the unknown ones with a k-nearest-neighbour
//! average fitted on the reference dataset.
//!
//! Distances use the NaN-aware Euclidean metric: for a query row `a` and a
//! reference row `b` over `n` columns,
//!
//! ```text
//! d(a, b) = sqrt(n / m * sum((a_i - b_i)^2))
//! ```
//!
//! where the sum and `m` cover only the columns present in both rows. Rows
//! sharing no present column have no distance and never act as donors.

use crate::row::InputRow;
use cropwise_core::{coerce_number, Coerced, Error, NamedVector, Result};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use tracing::debug;

/// Neighbours averaged per imputed cell
pub const DEFAULT_NEIGHBORS: usize = 5;

/// KNN imputer over a fixed reference matrix
#[derive(Debug, Clone)]
pub struct KnnImputer {
    n_neighbors: usize,
    /// Reference rows, each with one optional cell per column
    reference: Vec<Vec<Option<f64>>>,
    /// Per-column mean of present reference cells
    means: Vec<f64>,
}

impl KnnImputer {
    /// Fit on reference rows.
    ///
    /// Every column needs at least one present cell.
    pub fn fit(reference: Vec<Vec<Option<f64>>>, n_neighbors: usize) -> Result<Self> {
        let width = reference.first().map_or(0, Vec::len);
        if reference.iter().any(|row| row.len() != width) {
            return Err(Error::SchemaInvalid(
                "imputer reference rows differ in width".to_string(),
            ));
        }

        let means = (0..width)
            .map(|col| {
                let (sum, count) = reference
                    .iter()
                    .filter_map(|row| row[col])
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    Err(Error::SchemaInvalid(format!(
                        "imputer column {} has no reference values",
                        col
                    )))
                } else {
                    Ok(sum / count as f64)
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self {
            n_neighbors: n_neighbors.max(1),
            reference,
            means,
        })
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fill every `None` in `row`.
    ///
    /// Donors for a column are reference rows with that column present and a
    /// defined distance; the nearest `k` (ties by reference order) are averaged.
    /// A column without donors falls back to its reference mean.
    pub fn impute(&self, row: &[Option<f64>]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(Error::InvalidDimension {
                expected: self.width(),
                actual: row.len(),
            });
        }

        if row.iter().all(Option::is_some) {
            return Ok(row.iter().flatten().copied().collect());
        }

        let distances: Vec<Option<f64>> = self
            .reference
            .par_iter()
            .map(|reference_row| nan_euclidean(row, reference_row))
            .collect();

        Ok(row
            .iter()
            .enumerate()
            .map(|(col, cell)| match cell {
                Some(v) => *v,
                None => self.impute_column(col, &distances),
            })
            .collect())
    }

    fn impute_column(&self, col: usize, distances: &[Option<f64>]) -> f64 {
        let mut donors: Vec<(usize, f64)> = distances
            .iter()
            .enumerate()
            .filter_map(|(i, d)| match (d, self.reference[i][col]) {
                (Some(d), Some(_)) => Some((i, *d)),
                _ => None,
            })
            .collect();

        if donors.is_empty() {
            return self.means[col];
        }

        donors.sort_by_key(|&(_, d)| OrderedFloat(d));
        let k = self.n_neighbors.min(donors.len());
        let sum: f64 = donors[..k]
            .iter()
            .filter_map(|&(i, _)| self.reference[i][col])
            .sum();
        sum / k as f64
    }
}

/// NaN-aware Euclidean distance, `None` when the rows share no present column
fn nan_euclidean(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let mut present = 0usize;
    let mut accum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            let d = x - y;
            accum += d * d;
            present += 1;
        }
    }

    if present == 0 {
        return None;
    }
    let weight = a.len() as f64 / present as f64;
    Some((weight * accum).sqrt())
}

/// Numeric half of the feature pipeline
#[derive(Debug, Clone)]
pub struct NumericTransformer {
    columns: Vec<String>,
    imputer: Option<KnnImputer>,
}

impl NumericTransformer {
    /// A transformer for `columns` with an imputer fitted on `reference`
    /// (one row per observation, one cell per column).
    pub fn fit(
        columns: Vec<String>,
        reference: Vec<Vec<Option<f64>>>,
        n_neighbors: usize,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Ok(Self {
                columns,
                imputer: None,
            });
        }
        let imputer = KnnImputer::fit(reference, n_neighbors)?;
        if imputer.width() != columns.len() {
            return Err(Error::InvalidDimension {
                expected: columns.len(),
                actual: imputer.width(),
            });
        }
        Ok(Self {
            columns,
            imputer: Some(imputer),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn imputer(&self) -> Option<&KnnImputer> {
        self.imputer.as_ref()
    }

    /// Coerce each numeric cell of `row`, tagging failures
    pub fn coerce(&self, row: &InputRow) -> Vec<Coerced> {
        self.columns
            .iter()
            .map(|column| {
                let coerced = coerce_number(row.get(column));
                if coerced.is_invalid() {
                    debug!(column = %column, value = ?row.get(column), "non-numeric value treated as missing");
                }
                coerced
            })
            .collect()
    }

    /// One float per numeric column, aligned by name; unknown cells imputed
    pub fn transform(&self, row: &InputRow) -> Result<NamedVector> {
        let imputer = match &self.imputer {
            Some(imputer) => imputer,
            None => return Ok(NamedVector::empty()),
        };

        let cells: Vec<Option<f64>> = self
            .coerce(row)
            .into_iter()
            .map(Coerced::as_option)
            .collect();
        let missing = cells.iter().filter(|c| c.is_none()).count();
        if missing > 0 {
            debug!(missing, "imputing numeric cells");
        }

        let filled = imputer.impute(&cells)?;
        NamedVector::new(
            self.columns.clone(),
            filled.into_iter().map(|v| v as f32).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowBuilder;
    use serde_json::{json, Map, Value};

    fn reference() -> Vec<Vec<Option<f64>>> {
        vec![
            vec![Some(1.0), Some(10.0)],
            vec![Some(2.0), Some(20.0)],
            vec![Some(3.0), Some(30.0)],
            vec![Some(10.0), Some(100.0)],
        ]
    }

    #[test]
    fn test_nan_euclidean_weights_present_columns() {
        let d = nan_euclidean(&[Some(1.0), None], &[Some(4.0), Some(7.0)]).unwrap();
        // sqrt(2 / 1 * 9)
        assert!((d - 18f64.sqrt()).abs() < 1e-12);
        assert_eq!(nan_euclidean(&[None, None], &[Some(1.0), Some(2.0)]), None);
    }

    #[test]
    fn test_impute_uses_nearest_neighbours() {
        let imputer = KnnImputer::fit(reference(), 2).unwrap();
        let filled = imputer.impute(&[Some(2.2), None]).unwrap();
        assert_eq!(filled[0], 2.2);
        // nearest two on the first column are 2.0 and 3.0
        assert!((filled[1] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_larger_than_donors() {
        let imputer = KnnImputer::fit(reference(), 10).unwrap();
        let filled = imputer.impute(&[Some(0.0), None]).unwrap();
        assert!((filled[1] - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_missing_falls_back_to_means() {
        let imputer = KnnImputer::fit(reference(), DEFAULT_NEIGHBORS).unwrap();
        let filled = imputer.impute(&[None, None]).unwrap();
        assert_eq!(filled, vec![4.0, 40.0]);
    }

    #[test]
    fn test_donors_need_the_missing_column() {
        let reference = vec![
            vec![Some(1.0), None],
            vec![Some(5.0), Some(50.0)],
            vec![Some(9.0), Some(90.0)],
        ];
        let imputer = KnnImputer::fit(reference, 1).unwrap();
        // row 0 is closest but has no value to donate
        let filled = imputer.impute(&[Some(1.0), None]).unwrap();
        assert_eq!(filled[1], 50.0);
    }

    #[test]
    fn test_ties_resolved_by_reference_order() {
        let reference = vec![
            vec![Some(0.0), Some(1.0)],
            vec![Some(2.0), Some(3.0)],
        ];
        let imputer = KnnImputer::fit(reference, 1).unwrap();
        let filled = imputer.impute(&[Some(1.0), None]).unwrap();
        assert_eq!(filled[1], 1.0);
    }

    #[test]
    fn test_complete_row_untouched() {
        let imputer = KnnImputer::fit(reference(), 5).unwrap();
        assert_eq!(imputer.impute(&[Some(7.0), Some(8.0)]).unwrap(), vec![7.0, 8.0]);
    }

    #[test]
    fn test_fit_rejects_empty_column() {
        let reference = vec![vec![Some(1.0), None], vec![Some(2.0), None]];
        assert!(matches!(
            KnnImputer::fit(reference, 5),
            Err(Error::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_width_mismatch() {
        let imputer = KnnImputer::fit(reference(), 5).unwrap();
        assert!(matches!(
            imputer.impute(&[Some(1.0)]),
            Err(Error::InvalidDimension { .. })
        ));
    }

    fn transformer() -> NumericTransformer {
        NumericTransformer::fit(
            vec!["Soil_pH".to_string(), "Rainfall".to_string()],
            reference(),
            2,
        )
        .unwrap()
    }

    fn row(payload: Value) -> InputRow {
        RowBuilder::new(
            vec!["Soil_pH".to_string(), "Rainfall".to_string(), "Primary_Crop".to_string()],
            "Primary_Crop",
            "Paddy",
        )
        .build(payload.as_object().unwrap_or(&Map::new()))
    }

    #[test]
    fn test_transform_coerces_strings() {
        let out = transformer().transform(&row(json!({"Soil_pH": "3", "Rainfall": 30}))).unwrap();
        assert_eq!(out.names(), &["Soil_pH", "Rainfall"]);
        assert_eq!(out.values(), &[3.0, 30.0]);
    }

    #[test]
    fn test_invalid_values_are_imputed_like_missing() {
        let t = transformer();
        let invalid = t.transform(&row(json!({"Soil_pH": 2.2, "Rainfall": "heavy"}))).unwrap();
        let missing = t.transform(&row(json!({"Soil_pH": 2.2}))).unwrap();
        assert_eq!(invalid, missing);
        assert!((invalid.values()[1] - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_coerce_tags_outcomes() {
        let tags = transformer().coerce(&row(json!({"Soil_pH": "acidic"})));
        assert_eq!(tags, vec![Coerced::Invalid, Coerced::Missing]);
    }

    #[test]
    fn test_no_numeric_columns() {
        let t = NumericTransformer::fit(vec![], vec![], 5).unwrap();
        assert!(t.transform(&row(json!({}))).unwrap().is_empty());
        assert!(t.imputer().is_none());
    }
}
