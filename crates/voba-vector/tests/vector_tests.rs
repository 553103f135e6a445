use tempfile::TempDir;

use voba_core::traits::VectorIndex;
use voba_core::types::Chunk;
use voba_vector::{DistanceMetric, MemoryVectorIndex};

fn chunk(id: &str) -> Chunk {
    Chunk { id: id.into(), text: format!("text of {id}"), source_file: "doc".into(), chunk_index: 0, page: -1, kind: "text".into() }
}

fn seeded(metric: DistanceMetric) -> MemoryVectorIndex {
    let index = MemoryVectorIndex::new(metric);
    index
        .add(&[chunk("a"), chunk("b"), chunk("c")], &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]])
        .expect("add");
    index
}

#[test]
fn query_orders_by_ascending_distance() {
    let index = seeded(DistanceMetric::L2);
    let hits = index.query(&[1.0, 0.1], 3).expect("query");
    let ids: Vec<&str> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "b"]);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!(index.query(&[1.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn cosine_distance_is_bounded() {
    let index = seeded(DistanceMetric::Cosine);
    let hits = index.query(&[-1.0, 0.0], 3).unwrap();
    assert_eq!(hits[0].chunk.id, "b");
    assert!(hits.iter().all(|h| (0.0..=2.0).contains(&h.distance)));
    assert!((hits[2].distance - 2.0).abs() < 1e-6, "opposite vector is at distance 2");
}

#[test]
fn get_omits_unknown_ids() {
    let index = seeded(DistanceMetric::L2);
    let got = index.get(&["c".to_string(), "zzz".to_string(), "a".to_string()]).unwrap();
    let ids: Vec<&str> = got.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
}

#[test]
fn dimension_mismatch_is_an_error() {
    let index = seeded(DistanceMetric::L2);
    assert!(index.add(&[chunk("d")], &[vec![1.0, 2.0, 3.0]]).is_err());
    assert!(index.query(&[1.0], 1).is_err());
}

#[test]
fn snapshot_survives_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store/vectors.json");
    {
        let index = MemoryVectorIndex::open(&path, DistanceMetric::L2).unwrap();
        index.add(&[chunk("a")], &[vec![0.5, 0.5]]).unwrap();
        index.add(&[chunk("a")], &[vec![1.0, 0.0]]).unwrap();
        index.save().unwrap();
    }
    let reopened = MemoryVectorIndex::open(&path, DistanceMetric::L2).unwrap();
    assert_eq!(reopened.len(), 1, "re-adding an id replaces it");
    let hit = &reopened.query(&[1.0, 0.0], 1).unwrap()[0];
    assert!(hit.distance.abs() < 1e-6);
}
