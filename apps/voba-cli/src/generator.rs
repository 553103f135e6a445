use voba_core::traits::Generator;
use voba_core::types::{ChatMessage, Role};
use voba_guard::patterns::SUSPICIOUS_MARKER;
use voba_hybrid::prompt::NO_CONTEXT;
use voba_text::tokenize;

pub const NO_ANSWER: &str = "I don't know based on the indexed documents.";
pub const OFFLINE_CHAT_REPLY: &str = "No language model is configured. Use `voba ask` to answer from the indexed documents.";

/// Terms shorter than this do not count towards sentence overlap.
const MIN_TERM_CHARS: usize = 3;

/// Answers from the prompt itself: picks the context sentence that shares the
/// most terms with the question and cites its block label.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

struct Block<'a> {
    label: &'a str,
    text: String,
}

fn question_of(prompt: &str) -> &str {
    prompt.strip_prefix("Question: ").and_then(|rest| rest.split("\n\n").next()).unwrap_or(prompt)
}

fn context_of(prompt: &str) -> Option<&str> {
    let start = prompt.find("<context>\n")? + "<context>\n".len();
    let end = prompt[start..].find("\n</context>")? + start;
    Some(&prompt[start..end])
}

fn is_label(line: &str) -> bool {
    line.len() > 2 && line.starts_with('[') && line.ends_with(']') && line.contains('#')
}

fn blocks(context: &str) -> Vec<Block<'_>> {
    let mut out: Vec<Block<'_>> = Vec::new();
    for line in context.lines() {
        if is_label(line) {
            out.push(Block { label: &line[1..line.len() - 1], text: String::new() });
        } else if let Some(block) = out.last_mut() {
            if !block.text.is_empty() { block.text.push('\n'); }
            block.text.push_str(line);
        }
    }
    out.retain(|b| !b.text.trim().is_empty() && b.text.trim() != SUSPICIOUS_MARKER);
    out
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?']).map(str::trim).filter(|s| !s.is_empty())
}

fn overlap(terms: &[String], sentence: &str) -> usize {
    let words = tokenize(sentence);
    terms.iter().filter(|t| words.contains(t)).count()
}

impl ExtractiveGenerator {
    pub fn answer(&self, prompt: &str) -> String {
        let Some(context) = context_of(prompt) else { return NO_ANSWER.to_string() };
        if context.trim() == NO_CONTEXT { return NO_ANSWER.to_string(); }

        let mut terms: Vec<String> = tokenize(question_of(prompt)).into_iter().filter(|t| t.chars().count() >= MIN_TERM_CHARS).collect();
        terms.sort();
        terms.dedup();

        let mut best: Option<(usize, &str, &str)> = None;
        let parsed = blocks(context);
        for block in &parsed {
            for sentence in sentences(&block.text) {
                let score = overlap(&terms, sentence);
                if best.map_or(true, |(s, _, _)| score > s) { best = Some((score, sentence, block.label)); }
            }
        }
        match best {
            Some((_, sentence, label)) => format!("{sentence} [{label}]"),
            None => NO_ANSWER.to_string(),
        }
    }
}

impl Generator for ExtractiveGenerator {
    fn generate(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let prompt = messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.content.as_str()).unwrap_or_default();
        if context_of(prompt).is_none() { return Ok(OFFLINE_CHAT_REPLY.to_string()); }
        Ok(self.answer(prompt))
    }

    fn answers_chat(&self) -> bool { false }
}
