//! Byte-level lexer: source buffer → token stream.
//!
//! Scans left-to-right without backtracking. At each position it tries, in
//! order: whitespace, comments, keywords (at an identifier boundary),
//! two-character operators, single-character punctuation, identifiers,
//! string literals, and decimal integers. Anything else is a fatal
//! "cannot tokenize" error.

use subc_base::Span;

use crate::diagnostic::{CompileError, Result};
use crate::token::{Token, TokenKind, KEYWORDS};

const STRING_LITERAL_LIMIT: usize = 1024;

/// Tokenizes a full source buffer into a token stream ending in `Eof`.
pub struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenizes the whole buffer.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(tok) = self.next_token()? {
            tokens.push(tok);
        }

        tokens.push(Token::eof(Span::new(self.pos, self.pos)));
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(message, Span::new(self.pos, self.pos + 1))
    }

    /// Produces the next token, skipping whitespace and comments first.
    /// Returns `None` once the buffer is exhausted.
    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            match self.peek() {
                None => return Ok(None),
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                    continue;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    self.skip_line_comment();
                    continue;
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.skip_block_comment()?;
                    continue;
                }
                _ => break,
            }
        }

        let start = self.pos;

        if let Some(tok) = self.try_keyword(start) {
            return Ok(Some(tok));
        }
        if let Some(tok) = self.try_two_char_op(start) {
            return Ok(Some(tok));
        }
        if let Some(tok) = self.try_punctuation(start) {
            return Ok(Some(tok));
        }
        if let Some(tok) = self.try_identifier(start) {
            return Ok(Some(tok));
        }
        if self.peek() == Some(b'"') {
            return self.read_string(start).map(Some);
        }
        if self.peek().is_some_and(|b| b.is_ascii_digit()) {
            return Ok(Some(self.read_number(start)));
        }

        Err(self.error_here("cannot tokenize"))
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 2; // consume "/*"
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b'*'), Some(b'/')) => {
                    self.pos += 2;
                    return Ok(());
                }
                (Some(_), _) => self.pos += 1,
                (None, _) => {
                    return Err(CompileError::new(
                        "comment not terminated",
                        Span::new(start, self.pos),
                    ))
                }
            }
        }
    }

    fn is_ident_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_'
    }

    fn is_ident_start(b: u8) -> bool {
        b.is_ascii_alphabetic() || b == b'_'
    }

    fn try_keyword(&mut self, start: usize) -> Option<Token> {
        for kw in KEYWORDS {
            let end = start + kw.len();
            if self.bytes[start..].starts_with(kw.as_bytes())
                && !self.bytes.get(end).copied().is_some_and(Self::is_ident_byte)
            {
                self.pos = end;
                return Some(Token::new(TokenKind::Reserved, Span::new(start, end), *kw));
            }
        }
        None
    }

    fn try_two_char_op(&mut self, start: usize) -> Option<Token> {
        const OPS: &[&str] = &["==", "!=", "<=", ">="];
        for op in OPS {
            if self.bytes[start..].starts_with(op.as_bytes()) {
                self.pos = start + 2;
                return Some(Token::new(TokenKind::Reserved, Span::new(start, start + 2), *op));
            }
        }
        None
    }

    fn try_punctuation(&mut self, start: usize) -> Option<Token> {
        const PUNCT: &[u8] = b"+-*/()<>;={},&[]";
        let b = self.peek()?;
        if PUNCT.contains(&b) {
            self.pos += 1;
            let text = (b as char).to_string();
            return Some(Token::new(TokenKind::Reserved, Span::new(start, start + 1), text));
        }
        None
    }

    fn try_identifier(&mut self, start: usize) -> Option<Token> {
        if !self.peek().is_some_and(Self::is_ident_start) {
            return None;
        }
        self.pos += 1;
        while self.peek().is_some_and(Self::is_ident_byte) {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        Some(Token::new(TokenKind::Identifier, Span::new(start, self.pos), text))
    }

    fn read_string(&mut self, start: usize) -> Result<Token> {
        self.pos += 1; // opening quote
        let mut decoded = Vec::new();

        loop {
            match self.advance() {
                None | Some(b'\n') => {
                    return Err(CompileError::new(
                        "string literal not terminated",
                        Span::new(start, self.pos),
                    ))
                }
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = self.advance().ok_or_else(|| {
                        CompileError::new("string literal not terminated", Span::new(start, self.pos))
                    })?;
                    decoded.push(decode_escape(escaped));
                }
                Some(b) => decoded.push(b),
            }

            if decoded.len() > STRING_LITERAL_LIMIT {
                return Err(CompileError::new(
                    "string literal exceeds 1024 bytes",
                    Span::new(start, self.pos),
                ));
            }
        }

        decoded.push(0);
        let text = self.source[start..self.pos].to_string();
        Ok(Token::string(Span::new(start, self.pos), text, decoded))
    }

    fn read_number(&mut self, start: usize) -> Token {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        let value: i64 = text.parse().expect("scanned digits must parse");
        Token::number(Span::new(start, self.pos), text, value)
    }
}

/// Decodes a single escape character, e.g. `n` -> `\n` (0x0A).
/// Any byte with no special meaning decodes to itself.
fn decode_escape(b: u8) -> u8 {
    match b {
        b'a' => 0x07,
        b'b' => 0x08,
        b't' => 0x09,
        b'n' => 0x0A,
        b'v' => 0x0B,
        b'f' => 0x0C,
        b'r' => 0x0D,
        b'e' => 0x1B,
        b'0' => 0x00,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_simple_return() {
        let tokens = Lexer::new("return 0;").tokenize().unwrap();
        assert_eq!(tokens[0].text, "return");
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].value, 0);
        assert!(tokens[2].is(";"));
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn keyword_requires_identifier_boundary() {
        let tokens = Lexer::new("returnx").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "returnx");
    }

    #[test]
    fn two_char_operators_take_priority_over_single_char() {
        let tokens = Lexer::new("a <= b").tokenize().unwrap();
        assert!(tokens[1].is("<="));
    }

    #[test]
    fn line_comment_is_skipped() {
        let k = kinds("1 // trailing comment\n;");
        assert_eq!(k, vec![TokenKind::Number, TokenKind::Reserved, TokenKind::Eof]);
    }

    #[test]
    fn block_comment_is_skipped() {
        let k = kinds("1 /* skip\nthis */ ;");
        assert_eq!(k, vec![TokenKind::Number, TokenKind::Reserved, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        assert!(Lexer::new("1 /* oops").tokenize().is_err());
    }

    #[test]
    fn string_literal_decodes_escapes() {
        let tokens = Lexer::new(r#""abc\n\0def""#).tokenize().unwrap();
        assert_eq!(
            tokens[0].decoded,
            vec![b'a', b'b', b'c', 0x0A, 0x00, b'd', b'e', b'f', 0x00]
        );
        assert_eq!(tokens[0].decoded.len(), 9);
    }

    #[test]
    fn unterminated_string_is_fatal() {
        assert!(Lexer::new("\"abc").tokenize().is_err());
    }

    #[test]
    fn oversized_string_is_fatal() {
        let long = format!("\"{}\"", "a".repeat(1025));
        assert!(Lexer::new(&long).tokenize().is_err());
    }

    #[test]
    fn unknown_byte_is_fatal() {
        assert!(Lexer::new("@").tokenize().is_err());
    }

    #[test]
    fn identifier_can_start_with_underscore() {
        let tokens = Lexer::new("_foo").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "_foo");
    }
}
