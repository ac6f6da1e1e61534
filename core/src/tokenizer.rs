//! Text tokenization for training and for live queries.
//!
//! Raw text is NFC-normalized, split on whitespace, and each chunk is scanned
//! into word and punctuation tokens:
//!
//! ```
//! use wordpredict_core::tokenizer::{tokenize, TokenKind};
//!
//! let tokens = tokenize("Hello, world.");
//! let keys: Vec<&str> = tokens.iter().map(|t| t.key.as_str()).collect();
//! assert_eq!(keys, vec!["hello", ",", "world", "."]);
//! assert_eq!(tokens[0].text, "Hello");
//! assert_eq!(tokens[1].kind, TokenKind::Punctuation);
//! ```
//!
//! Apostrophes and hyphens stay inside a word when both neighbours are word
//! characters ("don't", "well-known"). Control characters separate tokens
//! like whitespace. Everything else that is neither a word character nor
//! whitespace becomes a single-character punctuation token.
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Word,
    Punctuation,
}

/// A normalized unit of text.
///
/// `text` keeps the original casing for display, `key` is the lower-cased
/// form used by every index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub key: String,
    pub kind: TokenKind,
}

impl Token {
    fn new(text: String, kind: TokenKind) -> Self {
        let key = text.to_lowercase();
        Self { text, key, kind }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }
}

/// Which query a consumer should issue for the current composition buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionMode {
    /// The buffer ends mid-word: complete the fragment.
    Spelling,
    /// The buffer ends in whitespace or punctuation (or is empty): predict
    /// what comes next.
    NextWord,
}

impl SuggestionMode {
    pub fn for_query(query: &str) -> Self {
        if ends_mid_word(query) {
            SuggestionMode::Spelling
        } else {
            SuggestionMode::NextWord
        }
    }
}

/// Letters, digits and combining marks (so that scripts with vowel signs,
/// and decomposed accents that have no precomposed form, stay whole).
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

/// True for the key of a word token, false for punctuation keys.
pub(crate) fn is_word_key(key: &str) -> bool {
    key.chars().next().is_some_and(is_word_char)
}

fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '-' | '\u{2010}' | '_')
}

/// Split `text` into word and punctuation tokens.
///
/// Pure and total: any input, including the empty string, yields a
/// (possibly empty) vector.
pub fn tokenize(text: &str) -> Vec<Token> {
    let normalized: String = text.nfc().collect();
    let mut tokens = Vec::new();

    for chunk in normalized.split_whitespace() {
        let chars: Vec<char> = chunk.chars().collect();
        let mut word = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if c.is_control() {
                if !word.is_empty() {
                    tokens.push(Token::new(std::mem::take(&mut word), TokenKind::Word));
                }
                continue;
            }
            if is_word_char(c) {
                word.push(c);
                continue;
            }

            let joins = is_joiner(c)
                && !word.is_empty()
                && chars.get(i + 1).copied().is_some_and(is_word_char);
            if joins {
                word.push(c);
                continue;
            }

            if !word.is_empty() {
                tokens.push(Token::new(std::mem::take(&mut word), TokenKind::Word));
            }
            tokens.push(Token::new(c.to_string(), TokenKind::Punctuation));
        }

        if !word.is_empty() {
            tokens.push(Token::new(word, TokenKind::Word));
        }
    }

    tokens
}

/// A joiner typed right after a word ("don'", "well-"): the text before it
/// and the joiner itself.
fn split_open_joiner(normalized: &str) -> Option<(&str, char)> {
    let mut chars = normalized.chars();
    let last = chars.next_back()?;
    let head = chars.as_str();
    (is_joiner(last) && head.chars().next_back().is_some_and(is_word_char)).then_some((head, last))
}

/// True when the user is still typing a word at the end of `query`: the last
/// character is a word character, or a joiner right after one.
pub fn ends_mid_word(query: &str) -> bool {
    let normalized: String = query.nfc().collect();
    normalized.chars().next_back().is_some_and(is_word_char)
        || split_open_joiner(&normalized).is_some()
}

/// The lower-cased word fragment being typed at the end of `query`,
/// including a trailing joiner (`"I don'"` gives `"don'"`).
///
/// Returns `None` when the query is empty or ends in whitespace or
/// punctuation.
pub fn partial_word(query: &str) -> Option<String> {
    let normalized: String = query.nfc().collect();
    if let Some((head, joiner)) = split_open_joiner(&normalized) {
        let word = tokenize(head).pop().filter(Token::is_word)?;
        return Some(format!("{}{}", word.key, joiner));
    }
    if !normalized.chars().next_back().is_some_and(is_word_char) {
        return None;
    }
    tokenize(&normalized)
        .pop()
        .filter(Token::is_word)
        .map(|t| t.key)
}

/// Keys of the last `max` tokens of `query`, oldest first.
///
/// Next-word prediction is issued once a word is complete, so the trailing
/// token always counts as context: `"I am"` gives `["i", "am"]`.
pub fn context_keys(query: &str, max: usize) -> Vec<String> {
    let tokens = tokenize(query);
    let skip = tokens.len().saturating_sub(max);
    tokens.into_iter().skip(skip).map(|t| t.key).collect()
}
