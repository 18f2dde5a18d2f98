//! Token types for the template lexer.

use crate::Location;

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Raw text content outside tags.
    Text,
    /// `{{ ... }}` output tag.
    Output,
    /// `{% ... %}` directive tag.
    Tag,
}

impl TokenType {
    /// Opening and closing delimiters for tag tokens.
    pub fn delimiters(self) -> Option<(&'static str, &'static str)> {
        match self {
            TokenType::Text => None,
            TokenType::Output => Some(("{{", "}}")),
            TokenType::Tag => Some(("{%", "%}")),
        }
    }
}

/// A token with its type, source text, and location.
///
/// `value` is the exact source slice, delimiters included, so that a tag can
/// be written back unchanged.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub location: Location,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, location: Location) -> Self {
        Self {
            token_type,
            value: value.into(),
            location,
        }
    }

    /// Text between the delimiters, trimmed. Text tokens return their value.
    pub fn content(&self) -> &str {
        match self.token_type.delimiters() {
            Some((open, close)) => self
                .value
                .strip_prefix(open)
                .and_then(|v| v.strip_suffix(close))
                .unwrap_or(&self.value)
                .trim(),
            None => &self.value,
        }
    }
}
