//! Text tokenization for the search index.
//!
//! Two scripts are recognised:
//!
//! - Latin-style text (anything alphanumeric outside the CJK block) is split
//!   into words on whitespace and punctuation
//! - CJK Unified Ideographs (U+4E00..=U+9FA5) become one term per character,
//!   with no multi-character segmentation
//!
//! Everything is lower-cased first. There is no stemming and no stop-word
//! list; duplicates are preserved so callers can count term frequency.

use crate::types::Bookmark;
use std::collections::HashMap;
use url::Url;

/// First code point of the CJK Unified Ideographs range handled as single-character terms
const CJK_START: char = '\u{4E00}';
/// Last code point of that range
const CJK_END: char = '\u{9FA5}';

/// Returns true for characters emitted as standalone terms.
pub fn is_cjk(c: char) -> bool {
    (CJK_START..=CJK_END).contains(&c)
}

/// Tokenize text into normalized search terms.
///
/// # Example
///
/// ```
/// use tagmark_core::tokenizer::tokenize;
///
/// assert_eq!(tokenize("Hello World"), vec!["hello", "world"]);
/// assert_eq!(tokenize("你好world"), vec!["你", "好", "world"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || is_cjk(c) {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in normalized.trim().chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut tokens);
            tokens.push(c.to_string());
        } else if c.is_whitespace() {
            flush_word(&mut word, &mut tokens);
        } else {
            word.push(c);
        }
    }
    flush_word(&mut word, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<String>) {
    if !word.is_empty() {
        tokens.push(std::mem::take(word));
    }
}

/// Extract every indexed term of a bookmark.
///
/// Terms come from, in order: title, description, notes, URL host, URL path
/// and each tag. A URL that does not parse is tokenized as raw text.
pub fn extract_terms(bookmark: &Bookmark) -> Vec<String> {
    let mut terms = tokenize(&bookmark.title);

    if let Some(description) = &bookmark.description {
        terms.extend(tokenize(description));
    }
    if let Some(notes) = &bookmark.notes {
        terms.extend(tokenize(notes));
    }

    if !bookmark.url.is_empty() {
        match Url::parse(&bookmark.url) {
            Ok(url) => {
                terms.extend(tokenize(url.host_str().unwrap_or_default()));
                terms.extend(tokenize(url.path()));
            }
            Err(_) => terms.extend(tokenize(&bookmark.url)),
        }
    }

    for tag in &bookmark.tags {
        terms.extend(tokenize(tag));
    }

    terms
}

/// Count occurrences of each extracted term of a bookmark.
pub fn term_frequencies(bookmark: &Bookmark) -> HashMap<String, u32> {
    let mut frequencies = HashMap::new();
    for term in extract_terms(bookmark) {
        *frequencies.entry(term).or_insert(0) += 1;
    }
    frequencies
}
