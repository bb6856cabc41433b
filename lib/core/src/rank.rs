//! Ranking of model scores into recommendations

use crate::{Error, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Number of recommendations returned per prediction
pub const DEFAULT_TOP_K: usize = 3;

/// Decimal places kept on returned scores
pub const SCORE_DECIMALS: i32 = 4;

/// A crop and the model's relative confidence in it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub crop: String,
    pub score: f64,
}

impl Recommendation {
    pub fn new(crop: impl Into<String>, score: f64) -> Self {
        Self {
            crop: crop.into(),
            score,
        }
    }
}

/// Round a raw model score to [`SCORE_DECIMALS`] places
pub fn round_score(score: f32) -> f64 {
    let factor = 10f64.powi(SCORE_DECIMALS);
    (f64::from(score) * factor).round() / factor
}

/// Rank `scores` (one per class, in class order) and keep the best `top_k`.
///
/// The sort is stable, so equal scores keep class order.
pub fn rank(scores: &[f32], classes: &[String], top_k: usize) -> Result<Vec<Recommendation>> {
    if scores.len() != classes.len() {
        return Err(Error::PredictionFailed(format!(
            "model produced {} scores for {} classes",
            scores.len(),
            classes.len()
        )));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(scores[i])));

    Ok(order
        .into_iter()
        .take(top_k)
        .map(|i| Recommendation::new(classes[i].clone(), round_score(scores[i])))
        .collect())
}
