//! Row building
//!
//! Maps an open-ended request payload onto the dataset's declared input
//! columns. No validation happens here; coercion belongs to the transformers.

use ahash::AHashMap;
use cropwise_core::is_truthy;
use serde_json::{Map, Value};

/// One request's raw values, one entry per declared input column
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    columns: Vec<String>,
    values: AHashMap<String, Option<Value>>,
}

impl InputRow {
    /// Declared columns in dataset order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Raw value of a column; `None` when the payload did not provide one
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column).and_then(Option::as_ref)
    }
}

/// Builds [`InputRow`]s against a fixed list of input columns
#[derive(Debug, Clone)]
pub struct RowBuilder {
    input_columns: Vec<String>,
    placeholder_column: String,
    placeholder_default: String,
}

impl RowBuilder {
    pub fn new(
        input_columns: Vec<String>,
        placeholder_column: impl Into<String>,
        placeholder_default: impl Into<String>,
    ) -> Self {
        Self {
            input_columns,
            placeholder_column: placeholder_column.into(),
            placeholder_default: placeholder_default.into(),
        }
    }

    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    pub fn placeholder_column(&self) -> &str {
        &self.placeholder_column
    }

    pub fn placeholder_default(&self) -> &str {
        &self.placeholder_default
    }

    /// Project `payload` onto the input columns.
    ///
    /// The placeholder column takes the payload value when it is truthy and the
    /// default otherwise. Every other column is copied verbatim. Payload keys
    /// outside the input columns are ignored.
    pub fn build(&self, payload: &Map<String, Value>) -> InputRow {
        let mut values = AHashMap::with_capacity(self.input_columns.len());

        for column in &self.input_columns {
            let provided = payload.get(column);
            let value = if *column == self.placeholder_column {
                match provided {
                    Some(v) if is_truthy(v) => Some(v.clone()),
                    _ => Some(Value::String(self.placeholder_default.clone())),
                }
            } else {
                provided.cloned()
            };
            values.insert(column.clone(), value);
        }

        InputRow {
            columns: self.input_columns.clone(),
            values,
        }
    }
}
