use std::cell::Cell;
use tempfile::TempDir;

use voba_cache::{CacheOptions, RagCache, RagOutcome, ResponseCache, DEFAULT_TAU};
use voba_core::types::ContextFingerprint;

fn fp(labels: &[&str]) -> ContextFingerprint { labels.iter().copied().collect() }

fn rag(tmp: &TempDir, tau: f64) -> RagCache {
    RagCache::new(ResponseCache::open(tmp.path(), "rag", CacheOptions::default()).unwrap(), tau)
}

#[test]
fn miss_then_fresh_hit_skips_generation() {
    let tmp = TempDir::new().unwrap();
    let cache = rag(&tmp, DEFAULT_TAU);
    let calls = Cell::new(0);
    let generate = || { calls.set(calls.get() + 1); Ok(format!("answer {}", calls.get())) };

    let first = cache.answer("what is x", &fp(&["doc#1", "doc#2"]), generate).unwrap();
    assert_eq!(first.outcome, RagOutcome::Miss);
    assert_eq!(first.answer, "answer 1");

    let second = cache.answer("What is X", &fp(&["doc#2", "doc#1"]), generate).unwrap();
    assert_eq!(second.outcome, RagOutcome::HitFresh);
    assert_eq!(second.answer, "answer 1");
    assert_eq!(calls.get(), 1);
}

#[test]
fn drifted_context_regenerates_and_overwrites() {
    let tmp = TempDir::new().unwrap();
    let cache = rag(&tmp, DEFAULT_TAU);
    cache.answer("q", &fp(&["doc#1", "doc#2"]), || Ok("old".to_string())).unwrap();

    // 2/3 overlap is below the default threshold
    let stale = cache.answer("q", &fp(&["doc#1", "doc#2", "doc#3"]), || Ok("new".to_string())).unwrap();
    assert_eq!(stale.outcome, RagOutcome::HitStale);
    assert_eq!(stale.answer, "new");

    let again = cache.answer("q", &fp(&["doc#1", "doc#2", "doc#3"]), || panic!("must not generate")).unwrap();
    assert_eq!(again.outcome, RagOutcome::HitFresh);
    assert_eq!(again.answer, "new");
}

#[test]
fn lower_tau_accepts_the_same_drift() {
    let tmp = TempDir::new().unwrap();
    let cache = rag(&tmp, 0.6);
    cache.answer("q", &fp(&["doc#1", "doc#2"]), || Ok("old".to_string())).unwrap();
    let hit = cache.answer("q", &fp(&["doc#1", "doc#2", "doc#3"]), || panic!("must not generate")).unwrap();
    assert_eq!(hit.outcome, RagOutcome::HitFresh);
    assert_eq!(hit.answer, "old");
}

#[test]
fn generation_failure_propagates_and_caches_nothing() {
    let tmp = TempDir::new().unwrap();
    let cache = rag(&tmp, DEFAULT_TAU);
    let err = cache.answer("q", &fp(&["doc#1"]), || anyhow::bail!("model offline"));
    assert!(err.is_err());
    assert!(cache.cache().get_payload("q").is_none());
}

#[test]
fn entries_without_fingerprint_are_stale_for_non_empty_context() {
    let tmp = TempDir::new().unwrap();
    let cache = rag(&tmp, DEFAULT_TAU);
    cache.cache().add("q", "legacy", None, None).unwrap();
    let out = cache.answer("q", &fp(&["doc#1"]), || Ok("fresh".to_string())).unwrap();
    assert_eq!(out.outcome, RagOutcome::HitStale);
    let empty = cache.answer("other", &fp(&[]), || Ok("a".to_string())).unwrap();
    assert_eq!(empty.outcome, RagOutcome::Miss);
    let empty_again = cache.answer("other", &fp(&[]), || panic!("must not generate")).unwrap();
    assert_eq!(empty_again.outcome, RagOutcome::HitFresh);
}
