use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use voba_cache::namespace::META_FILE;
use voba_cache::{CacheKind, CacheOptions, Clock, Lookup, ManualClock, MissReason, ResponseCache};

fn small_opts(max_bytes: u64) -> CacheOptions {
    CacheOptions { max_bytes, high_water: 0.9, low_water: 0.7, kind: CacheKind::Text }
}

fn open_manual(dir: &TempDir, opts: CacheOptions) -> (ResponseCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1000.0));
    let cache = ResponseCache::open_with_clock(dir.path(), "rag", opts, clock.clone() as Arc<dyn Clock>).expect("open");
    (cache, clock)
}

#[test]
fn round_trip_with_meta() {
    let tmp = TempDir::new().unwrap();
    let (cache, _) = open_manual(&tmp, CacheOptions::default());
    let mut meta = serde_json::Map::new();
    meta.insert("fingerprint".into(), serde_json::json!(["doc#1"]));
    let hashed = cache.add("What is RAG?", "Retrieval-augmented generation.\nTwo lines.", None, Some(meta.clone())).unwrap();
    assert_eq!(hashed.len(), 64);

    match cache.get("  what is   rag? ") {
        Lookup::Hit(hit) => {
            assert_eq!(hit.payload, "Retrieval-augmented generation.\nTwo lines.");
            assert_eq!(hit.extra_meta, Some(meta));
        }
        other => panic!("expected hit, got {other:?}"),
    }
    assert_eq!(cache.get_payload(&hashed).as_deref(), Some("Retrieval-augmented generation.\nTwo lines."));
    assert_eq!(cache.get("unknown"), Lookup::Miss(MissReason::NotFound));
}

#[test]
fn layout_is_sharded_by_hash_prefix() {
    let tmp = TempDir::new().unwrap();
    let (cache, _) = open_manual(&tmp, CacheOptions::default());
    let h = cache.add("q", "a", None, None).unwrap();
    let expected = tmp.path().join("rag").join(&h[..2]).join(&h[2..4]).join(format!("{h}.txt"));
    assert_eq!(cache.entry_path("q"), expected);
    let raw = fs::read_to_string(&expected).unwrap();
    let (header, payload) = raw.split_once('\n').unwrap();
    assert_eq!(payload, "a");
    let header: serde_json::Value = serde_json::from_str(header).unwrap();
    assert_eq!(header["orig_key"], "q");
    assert!(header["ttl"].is_null());
}

#[test]
fn ttl_expiry_uses_injected_clock_and_keeps_file() {
    let tmp = TempDir::new().unwrap();
    let (cache, clock) = open_manual(&tmp, CacheOptions::default());
    cache.add("k", "v", Some(Duration::from_secs(10)), None).unwrap();
    clock.advance(Duration::from_secs(5));
    assert_eq!(cache.get_payload("k").as_deref(), Some("v"));
    clock.advance(Duration::from_secs(6));
    assert_eq!(cache.get("k"), Lookup::Miss(MissReason::Expired));
    assert!(cache.entry_path("k").exists(), "expired entries wait for eviction");
}

#[test]
fn hit_refreshes_last_access() {
    let tmp = TempDir::new().unwrap();
    let (cache, clock) = open_manual(&tmp, CacheOptions::default());
    cache.add("k", "v", None, None).unwrap();
    clock.set(2000.0);
    assert!(matches!(cache.get("k"), Lookup::Hit(_)));
    let raw = fs::read_to_string(cache.entry_path("k")).unwrap();
    let header: serde_json::Value = serde_json::from_str(raw.lines().next().unwrap()).unwrap();
    assert_eq!(header["created"], 1000.0);
    assert_eq!(header["last"], 2000.0);
}

#[test]
fn corrupt_entry_is_a_miss() {
    let tmp = TempDir::new().unwrap();
    let (cache, _) = open_manual(&tmp, CacheOptions::default());
    cache.add("k", "v", None, None).unwrap();
    fs::write(cache.entry_path("k"), b"{broken\nv").unwrap();
    assert_eq!(cache.get("k"), Lookup::Miss(MissReason::Malformed));
}

#[test]
fn overwrite_replaces_payload_and_accounting() {
    let tmp = TempDir::new().unwrap();
    let (cache, _) = open_manual(&tmp, CacheOptions::default());
    cache.add("k", "first", None, None).unwrap();
    cache.add("k", "second answer", None, None).unwrap();
    assert_eq!(cache.get_payload("k").as_deref(), Some("second answer"));
    let on_disk = fs::metadata(cache.entry_path("k")).unwrap().len();
    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.approx_bytes, on_disk);
}

fn set_mtime(path: &std::path::Path, secs: u64) {
    let f = fs::File::options().write(true).open(path).unwrap();
    f.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
}

#[test]
fn purge_evicts_oldest_until_low_water() {
    let tmp = TempDir::new().unwrap();
    let (cache, _) = open_manual(&tmp, small_opts(1000));
    let payload = "x".repeat(180);
    for (i, key) in ["k1", "k2", "k3"].iter().enumerate() {
        cache.add(key, &payload, None, None).unwrap();
        set_mtime(&cache.entry_path(key), 1_000_000 + i as u64 * 1000);
    }
    assert_eq!(cache.stats().entries, 3, "below high water, nothing evicted yet");

    cache.add("k4", &payload, None, None).unwrap();

    assert!(cache.stats().approx_bytes <= 700);
    assert!(!cache.entry_path("k1").exists());
    assert!(!cache.entry_path("k2").exists());
    assert!(cache.entry_path("k3").exists());
    assert!(cache.entry_path("k4").exists());
    let on_disk: u64 = ["k3", "k4"].iter().map(|k| fs::metadata(cache.entry_path(k)).unwrap().len()).sum();
    assert_eq!(cache.stats().approx_bytes, on_disk);
}

#[test]
fn counter_survives_restart_and_is_recounted_without_meta() {
    let tmp = TempDir::new().unwrap();
    let bytes = {
        let (cache, _) = open_manual(&tmp, CacheOptions::default());
        cache.add("a", "alpha", None, None).unwrap();
        cache.add("b", "beta", None, None).unwrap();
        cache.stats().approx_bytes
    };
    let meta: serde_json::Value = serde_json::from_slice(&fs::read(tmp.path().join("rag").join(META_FILE)).unwrap()).unwrap();
    assert_eq!(meta["cache_size"], bytes);
    assert_eq!(meta["cache_type"], "rag");

    let reopened = ResponseCache::open(tmp.path(), "rag", CacheOptions::default()).unwrap();
    assert_eq!(reopened.stats().approx_bytes, bytes);
    drop(reopened);

    fs::write(tmp.path().join("rag").join(META_FILE), b"garbage").unwrap();
    let recounted = ResponseCache::open(tmp.path(), "rag", CacheOptions::default()).unwrap();
    assert_eq!(recounted.stats().approx_bytes, bytes);
}

#[test]
fn json_namespace_ignores_its_meta_file() {
    let tmp = TempDir::new().unwrap();
    let opts = CacheOptions { kind: CacheKind::Json, ..CacheOptions::default() };
    let cache = ResponseCache::open(tmp.path(), "sources", opts).unwrap();
    cache.add("k", r#"{"a":1}"#, None, None).unwrap();
    assert!(cache.entry_path("k").to_string_lossy().ends_with(".json"));
    assert_eq!(cache.stats().entries, 1);
}
