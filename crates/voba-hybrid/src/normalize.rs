//! Maps dense distances and lexical scores onto `[0, 1]` and blends them.
//!
//! Both signals are normalised per query batch, so the blended value is only
//! comparable within one result set.

use voba_core::types::{FusedResult, RankedHit};

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenseMetric {
    L2,
    Cosine,
    /// Negated distance, min-max normalised.
    Other,
}

impl DenseMetric {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "l2" => Self::L2,
            "cosine" => Self::Cosine,
            _ => Self::Other,
        }
    }

    fn similarity(&self, d: f64) -> f64 {
        match self {
            Self::Cosine => ((2.0 - d.clamp(0.0, 2.0)) / 2.0).clamp(0.0, 1.0),
            Self::L2 => 1.0 / (1.0 + d.max(0.0)),
            Self::Other => -d,
        }
    }
}

fn min_max(xs: &[f64]) -> Vec<f64> {
    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = (hi - lo).max(EPS);
    xs.iter().map(|x| (x - lo) / span).collect()
}

fn within_unit(xs: &[f64]) -> bool {
    !xs.is_empty() && xs.iter().all(|x| (-EPS..=1.0 + EPS).contains(x))
}

/// Blended quality score per position: `alpha * lexical + (1 - alpha) * dense`.
///
/// Output has `min(lexical_scores.len(), dense_distances.len())` entries,
/// each in `[0, 1]`. `alpha` is clamped; unknown metrics fall back to
/// min-max over the negated distance.
pub fn normalize(lexical_scores: &[f64], dense_distances: &[f64], metric: &str, alpha: f64) -> Vec<f64> {
    let alpha = if alpha.is_nan() { 0.5 } else { alpha.clamp(0.0, 1.0) };
    let metric = DenseMetric::parse(metric);

    let lexical: Vec<f64> = lexical_scores.iter().map(|s| if s.is_finite() { s.max(0.0).ln_1p() } else { 0.0 }).collect();
    let lexical = min_max(&lexical);

    let dense: Vec<f64> = dense_distances.iter().map(|&d| metric.similarity(if d.is_nan() { f64::INFINITY } else { d })).collect();
    let dense = if within_unit(&dense) { dense } else { min_max(&dense) };

    lexical
        .iter()
        .zip(&dense)
        .map(|(l, d)| {
            let v = alpha * l + (1.0 - alpha) * d;
            if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
        })
        .collect()
}

/// Fills `normalized_score` on fused results from the raw scores of the
/// source lists. A result the dense list did not return is scored as the
/// worst observed distance; one the lexical list did not return scores 0.
pub fn score_fused(results: &mut [FusedResult], dense: &[RankedHit], lexical: &[RankedHit], metric: &str, alpha: f64) {
    if results.is_empty() { return; }
    let worst = dense.iter().map(|h| h.raw_score).filter(|d| d.is_finite()).fold(None, |acc: Option<f32>, d| Some(acc.map_or(d, |a| a.max(d)))).unwrap_or(f32::MAX);
    let raw = |list: &[RankedHit], rank: Option<usize>| rank.and_then(|r| list.iter().find(|h| h.rank == r)).map(|h| h.raw_score as f64);

    let dense_d: Vec<f64> = results.iter().map(|r| raw(dense, r.dense_rank).unwrap_or(worst as f64)).collect();
    let lexical_s: Vec<f64> = results.iter().map(|r| raw(lexical, r.lexical_rank).unwrap_or(0.0)).collect();
    for (r, s) in results.iter_mut().zip(normalize(&lexical_s, &dense_d, metric, alpha)) {
        r.normalized_score = s;
    }
}
