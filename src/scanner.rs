//! Module `scanner` implements a one‑pass, streaming lexer for the Lox language.
//!
//! It transforms a byte slice (`&[u8]`) into a sequence of [`Token`]s, skipping
//! whitespace and comments, and emitting exactly one `EOF` token at the end.
//! Being a `FusedIterator`, it chains safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a [u8]) -> Scanner<'a>`
//! - `impl Iterator for Scanner<'a>` yielding `Result<Token, LoxError>`.
//!   A lex error does not stop the scanner; the next call resumes after the
//!   offending byte.
//! - `scan(src) -> (Vec<Token>, Vec<LoxError>)` collects both streams.
//!
//! Keywords are resolved through a compile-time perfect-hash map and `//`
//! comments are skipped in bulk with `memchr`.

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"break"  => TokenType::BREAK,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Lexer state over one source buffer.  Tokens own their lexemes, so the
/// scanner can be dropped as soon as it is drained.
pub struct Scanner<'a> {
    src: &'a [u8],
    start: usize, // first byte of the lexeme being scanned
    curr: usize,  // next byte to examine
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            done: false,
        }
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `ahead` positions past the cursor, `0` beyond the input.
    #[inline(always)]
    fn look(&self, ahead: usize) -> u8 {
        self.src.get(self.curr + ahead).copied().unwrap_or(0)
    }

    /// `long` if the next byte is `=` (consuming it), `short` otherwise.
    #[inline(always)]
    fn with_equal(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.look(0) == b'=' {
            self.curr += 1;
            long
        } else {
            short
        }
    }

    fn text(&self, from: usize, to: usize) -> String {
        String::from_utf8_lossy(&self.src[from..to]).into_owned()
    }

    /// Scans from `self.start`.  `Ok(None)` means whitespace or a comment
    /// was consumed and nothing is to be emitted.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind = match self.bump() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'?' => TokenType::QUESTION,
            b':' => TokenType::COLON,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'/' if self.look(0) == b'/' => {
                self.curr = match memchr(b'\n', &self.src[self.curr..]) {
                    Some(offset) => self.curr + offset,
                    None => self.src.len(),
                };
                return Ok(None);
            }
            b'/' => TokenType::SLASH,

            b' ' | b'\r' | b'\t' => return Ok(None),
            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            other => return Err(self.unexpected(other)),
        };

        Ok(Some(kind))
    }

    /// Consumes the rest of a multi-byte UTF-8 character starting with
    /// `first`, so it is reported once and shown as itself.
    fn unexpected(&mut self, first: u8) -> LoxError {
        let width = match first {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };

        for _ in 1..width {
            if !matches!(self.look(0), 0x80..=0xBF) {
                break;
            }
            self.curr += 1;
        }

        LoxError::lex(
            self.line,
            format!(
                "Unexpected character: {}",
                self.text(self.start, self.curr)
            ),
        )
    }

    /// String literals may span lines; the value excludes the quotes.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.look(0) != b'"' {
            if self.bump() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.curr += 1;

        Ok(TokenType::STRING(self.text(self.start + 1, self.curr - 1)))
    }

    fn number(&mut self) -> TokenType {
        while self.look(0).is_ascii_digit() {
            self.curr += 1;
        }

        if self.look(0) == b'.' && self.look(1).is_ascii_digit() {
            self.curr += 1;
            while self.look(0).is_ascii_digit() {
                self.curr += 1;
            }
        }

        // ASCII digits with at most one interior dot always parse.
        let value = self.text(self.start, self.curr).parse().unwrap_or(0.0);
        TokenType::NUMBER(value)
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.look(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.src[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    debug!("Scanned token ({:?}) on line {}", kind, self.line);
                    let lexeme = self.text(self.start, self.curr);
                    return Some(Ok(Token::new(kind, lexeme, self.line)));
                }
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan the whole of `src`, separating tokens from lex errors.
pub fn scan(src: &[u8]) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for result in Scanner::new(src) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
