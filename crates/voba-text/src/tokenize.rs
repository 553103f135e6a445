use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("Invalid word regex pattern"));

/// Lowercased `\w+` runs. Used for both documents and queries.
pub fn tokenize(text: &str) -> Vec<String> {
	let lowered = text.to_lowercase();
	WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}
