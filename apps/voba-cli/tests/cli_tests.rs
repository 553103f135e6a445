use std::fs;
use std::path::Path;
use tempfile::TempDir;

use voba_cache::RagOutcome;
use voba_cli::{index_directory, open_caches, open_pipeline, open_retriever, ExtractiveGenerator, NO_ANSWER, OFFLINE_CHAT_REPLY};
use voba_core::config::{PathsConfig, Settings};
use voba_core::traits::Generator;
use voba_core::types::{ChatMessage, Chunk};
use voba_guard::patterns::SUSPICIOUS_MARKER;
use voba_hybrid::prompt::{build_chat_messages, build_rag_messages};

fn settings(root: &Path) -> Settings {
    Settings {
        paths: PathsConfig {
            cache_dir: root.join("cache"),
            lexical_log: root.join("store/lexical.jsonl"),
            vector_store: root.join("store/vectors.json"),
            data_dir: root.join("data"),
        },
        ..Settings::default()
    }
}

fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("kernel.txt"),
        "The scheduler picks the next runnable thread on each tick.\n\nPage tables map virtual addresses to physical frames.",
    )
    .unwrap();
    fs::write(dir.join("garden.txt"), "Tomatoes need full sun and regular watering in summer.").unwrap();
}

fn chunk(file: &str, idx: i64, text: &str) -> Chunk {
    Chunk { id: format!("{file}-{idx}"), text: text.into(), source_file: file.into(), chunk_index: idx, page: -1, kind: "text".into() }
}

#[test]
fn extractive_answer_cites_best_matching_sentence() {
    let chunks = vec![
        chunk("garden.txt", 0, "Tomatoes need full sun. Water them daily."),
        chunk("kernel.txt", 3, "Interrupts are masked briefly. The scheduler picks the next thread."),
    ];
    let messages = build_rag_messages("Which component picks the next thread?", &chunks);
    let answer = ExtractiveGenerator.generate(&messages).unwrap();
    assert_eq!(answer, "The scheduler picks the next thread. [kernel.txt#3]");
}

#[test]
fn extractive_answer_without_context_says_so() {
    let messages = build_rag_messages("anything?", &[]);
    assert_eq!(ExtractiveGenerator.generate(&messages).unwrap(), NO_ANSWER);
}

#[test]
fn withheld_blocks_are_never_quoted() {
    let chunks = vec![chunk("evil.txt", 0, SUSPICIOUS_MARKER), chunk("ok.txt", 1, "Disks store blocks.")];
    let answer = ExtractiveGenerator.generate(&build_rag_messages("what about the assistant instruction", &chunks)).unwrap();
    assert_eq!(answer, "Disks store blocks. [ok.txt#1]");
}

#[test]
fn chat_without_context_gets_offline_reply() {
    assert_eq!(ExtractiveGenerator.generate(&build_chat_messages("hello")).unwrap(), OFFLINE_CHAT_REPLY);
    assert_eq!(ExtractiveGenerator.generate(&[ChatMessage::system("only system")]).unwrap(), OFFLINE_CHAT_REPLY);
}

#[test]
fn index_then_reopen_keeps_both_indexes() {
    let tmp = TempDir::new().unwrap();
    let settings = settings(tmp.path());
    write_corpus(&settings.paths.data_dir);

    let mut retriever = open_retriever(&settings).unwrap();
    let report = index_directory(&mut retriever, &settings.paths.data_dir, false).unwrap();
    assert_eq!((report.added, report.skipped), (3, 0));
    assert!(settings.paths.vector_store.exists());
    drop(retriever);

    let mut reopened = open_retriever(&settings).unwrap();
    assert_eq!(reopened.lexical().len(), 3);
    assert_eq!(reopened.vectors().len(), 3);
    let again = index_directory(&mut reopened, &settings.paths.data_dir, false).unwrap();
    assert_eq!((again.added, again.skipped), (0, 3));

    let results = reopened.retrieve("scheduler thread").unwrap();
    assert!(results[0].chunk.source_file.ends_with("kernel.txt"));
    assert_eq!(results[0].chunk.chunk_index, 0);
}

#[test]
fn ask_answers_from_corpus_and_caches() {
    let tmp = TempDir::new().unwrap();
    let settings = settings(tmp.path());
    write_corpus(&settings.paths.data_dir);
    index_directory(&mut open_retriever(&settings).unwrap(), &settings.paths.data_dir, false).unwrap();

    let pipeline = open_pipeline(&settings, Box::new(ExtractiveGenerator)).unwrap();
    let first = pipeline.ask("What picks the next runnable thread?").unwrap();
    assert_eq!(first.outcome, Some(RagOutcome::Miss));
    assert!(first.answer.starts_with("The scheduler picks the next runnable thread on each tick."));
    assert!(first.answer.contains("kernel.txt#0]"));

    let second = pipeline.ask("what picks the next runnable thread?").unwrap();
    assert_eq!(second.outcome, Some(RagOutcome::HitFresh));
    assert_eq!(second.answer, first.answer);
    drop(pipeline);

    let (rag, chat) = open_caches(&settings).unwrap();
    assert_eq!(rag.cache().stats().entries, 1);
    assert_eq!(chat.stats().entries, 0);
}

#[test]
fn offline_chat_reply_stays_out_of_the_cache() {
    let tmp = TempDir::new().unwrap();
    let settings = settings(tmp.path());
    let pipeline = open_pipeline(&settings, Box::new(ExtractiveGenerator)).unwrap();
    assert_eq!(pipeline.chat("hello there").unwrap(), OFFLINE_CHAT_REPLY);
    assert_eq!(pipeline.chat_cache().unwrap().stats().entries, 0);
}
