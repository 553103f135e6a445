use std::fs;
use std::io::Write;
use tempfile::TempDir;

use voba_text::LexicalIndex;

fn ids(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

fn corpus(dir: &TempDir) -> LexicalIndex {
    let mut index = LexicalIndex::open(dir.path().join("store/lexical.jsonl")).expect("open");
    index
        .add(
            &ids(&["a", "b", "c"]),
            &ids(&[
                "The Linux kernel schedules processes.",
                "Bread needs flour, water and salt.",
                "Kernel modules extend the kernel at runtime.",
            ]),
        )
        .expect("add");
    index
}

#[test]
fn missing_log_is_empty_index() {
    let tmp = TempDir::new().unwrap();
    let index = LexicalIndex::open(tmp.path().join("absent.jsonl")).expect("open");
    assert!(index.is_empty());
    assert!(index.search("anything", 5).unwrap().is_empty());
}

#[test]
fn search_ranks_by_descending_bm25() {
    let tmp = TempDir::new().unwrap();
    let index = corpus(&tmp);
    let hits = index.search("KERNEL", 10).expect("search");
    let got: Vec<&str> = hits.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(got, vec!["c", "a", "b"], "two kernel mentions outrank one, non-matching last");
    assert!(hits[0].1 > hits[1].1);
    assert!(hits[1].1 > 0.0);
    assert_eq!(hits[2].1, 0.0);
}

#[test]
fn search_respects_top_k_and_degenerate_inputs() {
    let tmp = TempDir::new().unwrap();
    let index = corpus(&tmp);
    assert_eq!(index.search("kernel bread", 1).unwrap().len(), 1);
    assert!(index.search("kernel", 0).unwrap().is_empty());

    let only_match = index.search("kernel", 3).unwrap();
    assert_eq!(only_match.len(), 3);
    assert_eq!(only_match[2], ("b".to_string(), 0.0));
}

#[test]
fn unmatched_documents_pad_in_log_order() {
    let tmp = TempDir::new().unwrap();
    let index = corpus(&tmp);
    for query in ["quantum", "?!"] {
        let hits = index.search(query, 5).unwrap();
        assert_eq!(hits, vec![("a".to_string(), 0.0), ("b".to_string(), 0.0), ("c".to_string(), 0.0)], "query: {query}");
    }
    assert_eq!(index.search("quantum", 2).unwrap().len(), 2);
}

#[test]
fn log_is_jsonl_and_replayed_on_open() {
    let tmp = TempDir::new().unwrap();
    let log = {
        let index = corpus(&tmp);
        index.log_path().to_path_buf()
    };
    let content = fs::read_to_string(&log).unwrap();
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["id"], "a");
    assert_eq!(first["tokens"], serde_json::json!(["the", "linux", "kernel", "schedules", "processes"]));

    let reopened = LexicalIndex::open(&log).expect("reopen");
    assert_eq!(reopened.len(), 3);
    assert!(reopened.contains("b"));
    assert_eq!(reopened.search("flour", 5).unwrap()[0].0, "b");
}

#[test]
fn appends_extend_the_corpus() {
    let tmp = TempDir::new().unwrap();
    let mut index = corpus(&tmp);
    index.add(&ids(&["d"]), &ids(&["Sourdough bread rises slowly."])).unwrap();
    let hits = index.search("bread", 5).unwrap();
    assert_eq!(hits.len(), 4);
    let matched: Vec<&str> = hits.iter().filter(|(_, s)| *s > 0.0).map(|(id, _)| id.as_str()).collect();
    assert_eq!(matched.len(), 2);
    assert!(matched.contains(&"b") && matched.contains(&"d"));
    assert_eq!(fs::read_to_string(index.log_path()).unwrap().lines().count(), 4);
}

#[test]
fn malformed_and_torn_lines_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("lexical.jsonl");
    {
        let mut f = fs::File::create(&log).unwrap();
        writeln!(f, r#"{{"id":"ok","tokens":["rust","borrow","checker"]}}"#).unwrap();
        writeln!(f, "not json at all").unwrap();
        write!(f, r#"{{"id":"torn","tokens":["ru"#).unwrap();
    }
    let mut index = LexicalIndex::open(&log).expect("open");
    assert_eq!(index.len(), 1);
    assert!(!index.contains("torn"));

    index.add(&ids(&["next"]), &ids(&["rust traits"])).unwrap();
    let reopened = LexicalIndex::open(&log).expect("reopen");
    assert_eq!(reopened.len(), 2, "append after a torn line starts on a fresh line");
    assert!(reopened.contains("next"));
}

#[test]
fn mismatched_lengths_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut index = LexicalIndex::open(tmp.path().join("l.jsonl")).unwrap();
    assert!(index.add(&ids(&["a", "b"]), &ids(&["only one"])).is_err());
}

#[test]
fn torn_tail_written_after_open_does_not_swallow_next_record() {
    let tmp = TempDir::new().unwrap();
    let log = tmp.path().join("lexical.jsonl");
    let mut index = LexicalIndex::open(&log).unwrap();
    index.add(&ids(&["first"]), &ids(&["disk quotas"])).unwrap();
    {
        let mut f = fs::OpenOptions::new().append(true).open(&log).unwrap();
        write!(f, r#"{{"id":"half","tok"#).unwrap();
    }
    index.add(&ids(&["second"]), &ids(&["inode tables"])).unwrap();

    let reopened = LexicalIndex::open(&log).unwrap();
    assert_eq!(reopened.len(), 2);
    assert!(reopened.contains("first") && reopened.contains("second"));
    assert!(!reopened.contains("half"));
}
