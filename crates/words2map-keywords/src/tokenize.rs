use crate::stopwords::is_stopword;
use regex::Regex;
use std::sync::LazyLock;

/// Runs of letters and digits. Punctuation, apostrophes and underscores split
/// tokens, so no token can collide with the `_` n-gram joiner.
static WORD: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[\p{L}\p{N}]+").expect("word pattern is valid")
});

/// Split text into alphanumeric tokens, dropping exact stopword matches.
/// Case is preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str())
        .filter(|w| !is_stopword(w))
        .map(str::to_string)
        .collect()
}
