use voba_core::types::ContextFingerprint;

pub const DEFAULT_TAU: f64 = 0.8;

/// `|A ∩ B| / |A ∪ B|`; two empty sets count as identical.
pub fn jaccard(a: &ContextFingerprint, b: &ContextFingerprint) -> f64 {
    let union = a.union_len(b);
    if union == 0 { return 1.0; }
    a.intersection_len(b) as f64 / union as f64
}

/// Whether an answer built from `cached` context can be served for a query
/// that now retrieves `new`.
pub fn is_fresh(new: &ContextFingerprint, cached: &ContextFingerprint, tau: f64) -> bool {
    if new.is_empty() && cached.is_empty() { return true; }
    jaccard(new, cached) >= tau
}
