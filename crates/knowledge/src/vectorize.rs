//! Bag-of-words vectorization.
//!
//! Tokens are maximal runs of ASCII word characters (`[a-z0-9_]`) after
//! lower-casing; everything else is a delimiter. This matches the vectors
//! already stored by earlier clients of the same collection.

use crate::types::TermVector;

/// Split text into lower-cased word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !is_word_char(c))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Term-frequency vector of `text`. Empty input yields an empty vector.
pub fn vectorize(text: &str) -> TermVector {
    let mut vector = TermVector::new();
    for token in tokenize(text) {
        *vector.entry(token).or_insert(0) += 1;
    }
    vector
}

/// Concatenate the fields a document vector is computed from.
pub fn document_text(
    title: &str,
    content: &str,
    category: Option<&str>,
    keywords: &[String],
) -> String {
    [title, content, category.unwrap_or_default(), keywords.join(" ").as_str()].join(" ")
}
