/// Similarity Metrics
///
/// Pure scoring functions over two positionally aligned vectors.
///
/// Entries are `Option<f64>`: `None` marks a position with no value (an item
/// the user never rated, an empty rating bucket). Cosine and Pearson read an
/// absent entry as 0. Jaccard and Dice count matches by presence and
/// equality; the Dice denominator sums the present values.
///
/// Every metric returns a finite value. Zero magnitudes, zero denominators
/// and degenerate inputs (both vectors empty or all zero) score 0.
use super::RecommendError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    Cosine,
    Jaccard,
    Dice,
    Pearson,
}

impl SimilarityMetric {
    pub const ALL: [SimilarityMetric; 4] = [
        SimilarityMetric::Cosine,
        SimilarityMetric::Jaccard,
        SimilarityMetric::Dice,
        SimilarityMetric::Pearson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Jaccard => "jaccard",
            SimilarityMetric::Dice => "dice",
            SimilarityMetric::Pearson => "pearson",
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = RecommendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "jaccard" => Ok(SimilarityMetric::Jaccard),
            "dice" => Ok(SimilarityMetric::Dice),
            "pearson" => Ok(SimilarityMetric::Pearson),
            other => Err(RecommendError::InvalidMetric(other.to_string())),
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Divide, returning 0 for a zero denominator or a non-finite quotient
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }

    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        0.0
    }
}

/// Score two aligned vectors under `metric`
pub fn similarity(metric: SimilarityMetric, a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    if a.len() != b.len() {
        warn!(
            metric = metric.as_str(),
            left_len = a.len(),
            right_len = b.len(),
            "Similarity vectors differ in length, scoring 0"
        );
        return 0.0;
    }

    if is_degenerate(a) && is_degenerate(b) {
        return 0.0;
    }

    let score = match metric {
        SimilarityMetric::Cosine => cosine(a, b),
        SimilarityMetric::Jaccard => jaccard(a, b),
        SimilarityMetric::Dice => dice(a, b),
        SimilarityMetric::Pearson => pearson(a, b),
    };

    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Score two dense vectors; every entry counts as present
pub fn similarity_dense(metric: SimilarityMetric, a: &[f64], b: &[f64]) -> f64 {
    let a: Vec<Option<f64>> = a.iter().copied().map(Some).collect();
    let b: Vec<Option<f64>> = b.iter().copied().map(Some).collect();
    similarity(metric, &a, &b)
}

/// Lenient form: an unknown metric name scores 0 instead of failing
pub fn similarity_by_name(name: &str, a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    match name.parse::<SimilarityMetric>() {
        Ok(metric) => similarity(metric, a, b),
        Err(_) => {
            debug!(metric = name, "Unknown similarity metric, scoring 0");
            0.0
        }
    }
}

fn is_degenerate(v: &[Option<f64>]) -> bool {
    v.iter().flatten().all(|x| *x == 0.0)
}

fn value(entry: &Option<f64>) -> f64 {
    entry.unwrap_or(0.0)
}

fn present_sum(v: &[Option<f64>]) -> f64 {
    v.iter().flatten().sum()
}

fn intersection(a: &[Option<f64>], b: &[Option<f64>]) -> usize {
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| matches!((x, y), (Some(x), Some(y)) if x == y))
        .count()
}

/// cos(A, B) = (A · B) / (||A|| × ||B||)
fn cosine(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| value(x) * value(y)).sum();
    let norm_a: f64 = a.iter().map(|x| value(x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| value(x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    safe_divide(dot, norm_a * norm_b).clamp(-1.0, 1.0)
}

fn jaccard(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let union = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| x.is_some() || y.is_some())
        .count();

    safe_divide(intersection(a, b) as f64, union as f64)
}

/// 2 × |intersection| / (Σ A + Σ B) over present values
fn dice(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let total = present_sum(a) + present_sum(b);
    safe_divide(2.0 * intersection(a, b) as f64, total)
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let n = a.len() as f64;
    if n == 0.0 {
        return 0.0;
    }

    let sum_a: f64 = a.iter().map(value).sum();
    let sum_b: f64 = b.iter().map(value).sum();
    let sum_a_sq: f64 = a.iter().map(|x| value(x).powi(2)).sum();
    let sum_b_sq: f64 = b.iter().map(|x| value(x).powi(2)).sum();
    let product_sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| value(x) * value(y)).sum();

    let numerator = product_sum - (sum_a * sum_b) / n;
    let denominator = ((sum_a_sq - sum_a.powi(2) / n) * (sum_b_sq - sum_b.powi(2) / n)).sqrt();

    safe_divide(numerator, denominator).clamp(-1.0, 1.0)
}
