//! Local tokenizers used before handing text to the parser.

use std::sync::LazyLock;

use regex::Regex;

/// Split on runs of spaces, dropping empty pieces.
pub fn whitespace_tokens(text: &str) -> Vec<String> {
    text.split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split into single ASCII punctuation marks and runs of word characters.
///
/// Anything else (other symbols, whitespace) is dropped.
pub fn regex_tokens(text: &str) -> Vec<String> {
    static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r##"[!"#$%&'()*+,\-./:;<=>?@\[\]^_`{|}~]|\w+"##).expect("valid regex")
    });

    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
