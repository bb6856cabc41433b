use serde::{Deserialize, Serialize};

/// A dense feature vector in the exact column order a model was trained on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self { data: vec![0.0; dim] }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Dot product against a column of a row-major weight matrix
    #[inline]
    pub fn dot_column(&self, weights: &[Vec<f32>], column: usize) -> f32 {
        self.data
            .iter()
            .zip(weights.iter())
            .map(|(x, row)| x * row[column])
            .sum()
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}
