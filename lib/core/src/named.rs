//! Named vectors
//!
//! Column-labelled values with an explicit reindex onto a target schema.
//! Reindexing is the only way a row reaches the model, so column order in the
//! output is always the order of the target name list.

use crate::{Error, Result, Vector};
use ahash::AHashMap;

/// An ordered list of `(name, value)` columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedVector {
    names: Vec<String>,
    values: Vec<f32>,
}

impl NamedVector {
    /// Create a named vector, checking that every name has a value
    pub fn new(names: Vec<String>, values: Vec<f32>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(Error::InvalidDimension {
                expected: names.len(),
                actual: values.len(),
            });
        }
        Ok(Self { names, values })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: f32) {
        self.names.push(name.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value for a column, first occurrence wins
    pub fn get(&self, name: &str) -> Option<f32> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Append the columns of `other` after the columns of `self`
    pub fn concat(mut self, other: NamedVector) -> Self {
        self.names.extend(other.names);
        self.values.extend(other.values);
        self
    }

    /// Reshape onto `target`.
    ///
    /// The result has exactly `target.len()` columns in `target` order. Names
    /// missing from `self` are filled with 0; names not in `target` are dropped.
    pub fn reindex(&self, target: &[String]) -> NamedVector {
        let mut lookup: AHashMap<&str, f32> = AHashMap::with_capacity(self.names.len());
        for (name, value) in self.names.iter().zip(self.values.iter()) {
            lookup.entry(name.as_str()).or_insert(*value);
        }

        let values = target
            .iter()
            .map(|name| lookup.get(name.as_str()).copied().unwrap_or(0.0))
            .collect();

        NamedVector {
            names: target.to_vec(),
            values,
        }
    }

    /// Names present in `self` but not in `target`
    pub fn dropped_by<'a>(&'a self, target: &[String]) -> Vec<&'a str> {
        let keep: ahash::AHashSet<&str> = target.iter().map(String::as_str).collect();
        self.names
            .iter()
            .map(String::as_str)
            .filter(|name| !keep.contains(name))
            .collect()
    }

    /// Drop the names and keep the values in column order
    pub fn into_vector(self) -> Vector {
        Vector::new(self.values)
    }
}
