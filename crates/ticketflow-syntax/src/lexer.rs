//! Hand-written lexer for page templates.
//!
//! Scans raw text for the `{{` and `{%` delimiters and cuts the source into
//! a flat stream of text, output, and directive tokens. A delimiter with no
//! matching close is plain text.

use crate::token::{Token, TokenType};
use crate::Location;

/// Tokenize a source string into a sequence of tokens.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut text_start = self.location();
        let mut text = String::new();

        while self.pos < self.source.len() {
            if let Some((token_type, len)) = self.tag_at_cursor() {
                if !text.is_empty() {
                    tokens.push(Token::new(TokenType::Text, std::mem::take(&mut text), text_start));
                }
                let loc = self.location();
                let value = &self.source[self.pos..self.pos + len];
                tokens.push(Token::new(token_type, value, loc));
                self.advance(len);
                text_start = self.location();
                continue;
            }

            // Copy plain text up to the next `{` that could open a tag.
            let rest = &self.source[self.pos..];
            let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            let next = rest[first..]
                .find('{')
                .map(|i| i + first)
                .unwrap_or(rest.len());
            if text.is_empty() {
                text_start = self.location();
            }
            text.push_str(&rest[..next]);
            self.advance(next);
        }

        if !text.is_empty() {
            tokens.push(Token::new(TokenType::Text, text, text_start));
        }

        tokens
    }

    /// If a complete tag starts at the cursor, its type and byte length.
    fn tag_at_cursor(&self) -> Option<(TokenType, usize)> {
        let rest = &self.source[self.pos..];
        [TokenType::Output, TokenType::Tag]
            .into_iter()
            .find_map(|token_type| {
                let (open, close) = token_type.delimiters()?;
                let body = rest.strip_prefix(open)?;
                let end = body.find(close)?;
                Some((token_type, open.len() + end + close.len()))
            })
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.col, self.pos)
    }

    /// Advance by `n` bytes, updating line/column tracking.
    fn advance(&mut self, n: usize) {
        for ch in self.source[self.pos..self.pos + n].chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos += n;
    }
}
