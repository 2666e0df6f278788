//! Tokens produced by analysis chains
//!
//! [`Token`] is what stages pass to each other: text, category and the char
//! offsets of the token in the char-filtered stream. [`TokenRecord`] is what
//! a chain emits to its caller: just text and category.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category names used by the built-in tokenizers.
pub mod category {
    pub const WORD: &str = "word";
    pub const NUMBER: &str = "number";
    pub const ALPHANUM: &str = "alphanum";
}

/// A token travelling between stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub category: String,
    /// Char offset of the first char, in the stream the tokenizer saw
    pub start: usize,
    /// Char offset one past the last char
    pub end: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, category: impl Into<String>, start: usize, end: usize) -> Self {
        Token {
            text: text.into(),
            category: category.into(),
            start,
            end,
        }
    }

    /// A copy of this token with different text, keeping category and offsets.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            ..self
        }
    }
}

/// One emitted unit: surface text plus category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub text: String,
    pub category: String,
}

impl TokenRecord {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        TokenRecord {
            text: text.into(),
            category: category.into(),
        }
    }
}

impl From<Token> for TokenRecord {
    fn from(token: Token) -> Self {
        TokenRecord {
            text: token.text,
            category: token.category,
        }
    }
}

/// Renders as `<text>\t<category>`, the line format of the output file.
impl fmt::Display for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.text, self.category)
    }
}
