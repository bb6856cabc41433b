//! Categorical encoding
//!
//! Drop-first one-hot encoding against a template captured from the reference
//! dataset. For each categorical column the distinct values (missing cells
//! read as the unknown token) are sorted, the first becomes the implicit
//! baseline and every other value gets a `"{column}_{value}"` indicator.
//!
//! A request value outside the column's training categories resolves to the
//! unknown token, so an unseen value and a missing one always encode alike.
//! The result is then reindexed onto the template; the baseline, and the
//! unknown token when training had no missing cells, encode as all zeros.

use crate::dataset::ReferenceTable;
use crate::row::InputRow;
use ahash::AHashSet;
use cropwise_core::{category_label, Error, NamedVector, Result};
use tracing::debug;

/// Token standing in for a missing categorical value
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Indicator column name for a category
pub fn indicator_name(column: &str, value: &str) -> String {
    format!("{}_{}", column, value)
}

/// Sorted distinct categories of each column, missing cells read as `unknown`
pub fn column_categories(
    table: &ReferenceTable,
    columns: &[String],
    unknown: &str,
) -> Result<Vec<Vec<String>>> {
    columns
        .iter()
        .map(|column| {
            table.distinct_sorted(column, unknown).ok_or_else(|| {
                Error::SchemaInvalid(format!("categorical column '{}' not in dataset", column))
            })
        })
        .collect()
}

/// Drop-first template: every category but the first, per column
pub fn build_template(columns: &[String], categories: &[Vec<String>]) -> Vec<String> {
    columns
        .iter()
        .zip(categories)
        .flat_map(|(column, values)| values.iter().skip(1).map(move |v| indicator_name(column, v)))
        .collect()
}

/// Categorical half of the feature pipeline
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    columns: Vec<String>,
    known: Vec<AHashSet<String>>,
    template: Vec<String>,
    unknown: String,
}

impl CategoricalEncoder {
    /// Encoder over `columns`, each with its sorted training categories
    pub fn new(columns: Vec<String>, categories: Vec<Vec<String>>, unknown: impl Into<String>) -> Result<Self> {
        if columns.len() != categories.len() {
            return Err(Error::InvalidDimension {
                expected: columns.len(),
                actual: categories.len(),
            });
        }
        let template = build_template(&columns, &categories);
        let known = categories
            .into_iter()
            .map(|values| values.into_iter().collect())
            .collect();
        Ok(Self {
            columns,
            known,
            template,
            unknown: unknown.into(),
        })
    }

    /// Capture the categories of `columns` from `table` and build the encoder
    pub fn fit(table: &ReferenceTable, columns: Vec<String>, unknown: &str) -> Result<Self> {
        let categories = column_categories(table, &columns, unknown)?;
        Self::new(columns, categories, unknown)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn template(&self) -> &[String] {
        &self.template
    }

    /// The category each column resolves to.
    ///
    /// Missing values and values never seen in training become the unknown token.
    pub fn categories(&self, row: &InputRow) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.known)
            .map(|(column, known)| match category_label(row.get(column)) {
                Some(label) if known.contains(&label) => label,
                Some(label) => {
                    debug!(column = %column, value = %label, "unseen category treated as unknown");
                    self.unknown.clone()
                }
                None => self.unknown.clone(),
            })
            .collect()
    }

    /// Binary vector over the template columns
    pub fn transform(&self, row: &InputRow) -> NamedVector {
        if self.columns.is_empty() {
            return NamedVector::empty();
        }

        let mut produced = NamedVector::with_capacity(self.columns.len());
        for (column, category) in self.columns.iter().zip(self.categories(row)) {
            produced.push(indicator_name(column, &category), 1.0);
        }

        let dropped = produced.dropped_by(&self.template);
        if !dropped.is_empty() {
            debug!(?dropped, "categories without a template column encode as baseline");
        }

        produced.reindex(&self.template)
    }
}
