//! Module `scanner` implements a one‑pass, streaming lexer.
//!
//! It transforms a source `&str` into a sequence of [`Token`]s, skipping
//! whitespace and comments, and emitting exactly one `EOF` token at the end.
//! Designed as a `FusedIterator`, it can be chained safely with other iterator
//! adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Borrows the source; positions start at line 1, column 1.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, LoxError>` on each `.next()`.  Lexical errors are
//!   yielded in place and scanning carries on with the next character.
//!
//! - `Scanner::scan_tokens(self, reporter)`
//!   Drains the iterator, sends every error to the [`Reporter`], and returns
//!   the tokens only if nothing was reported.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`, `?`, `:`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`.
//! - Comments: `//` to end of line, `/* … */` across lines (not nested).
//! - String literals: `"` … `"`, may span lines, no escape processing.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords: resolved via a perfect‑hash `KEYWORDS` map.
//!
//! Comment skipping uses `memchr` / `memmem` rather than a byte loop.

use crate::error::{LoxError, Phase, Reporter, Result};
use crate::token::{Literal, Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter, memmem, memrchr};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Reserved words
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
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

/// A single pass **scanner / lexer** over a UTF‑8 source string.
pub struct Scanner<'a> {
    src: &'a str,
    start: usize,      // byte index of the first byte of the current lexeme
    curr: usize,       // byte index one past the last byte examined
    line: usize,       // 1‑based line counter
    line_start: usize, // byte index where the current line begins
    pending: Option<(TokenType, Option<Literal>)>,
    done: bool,
}

impl<'a> Scanner<'a> {
    /// Lexer positioned at the first byte of `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            line_start: 0,
            pending: None,
            done: false,
        }
    }

    /// Scan the whole input.  Every lexical error is sent to `reporter`
    /// exactly once; if any were sent the tokens are discarded and
    /// `LoxError::Aborted` is returned.
    pub fn scan_tokens(self, reporter: &mut dyn Reporter) -> Result<Vec<Token>> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: usize = 0;

        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(LoxError::Lex {
                    message,
                    line,
                    column,
                }) => {
                    errors += 1;
                    reporter.report(None, line, column, &message);
                }
                Err(e) => return Err(e),
            }
        }

        if errors > 0 {
            info!("Scanning finished with {} error(s)", errors);

            return Err(LoxError::Aborted {
                phase: Phase::Scan,
                errors,
            });
        }

        info!("Scanning produced {} tokens", tokens.len());

        Ok(tokens)
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes()[self.curr]
        }
    }

    /// One byte beyond [`peek`], or `0` past EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.src.len() {
            0
        } else {
            self.bytes()[self.curr + 1]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// 1‑based column of byte `index`, counted in characters.
    #[inline(always)]
    fn column_of(&self, index: usize) -> usize {
        let prefix: &str = &self.src[self.line_start..index];

        if prefix.is_ascii() {
            prefix.len() + 1
        } else {
            prefix.chars().count() + 1
        }
    }

    #[inline(always)]
    fn newline_at(&mut self, index: usize) {
        self.line += 1;
        self.line_start = index + 1;
    }

    #[inline(always)]
    fn emit(&mut self, tt: TokenType) {
        self.pending = Some((tt, None));
    }

    #[inline(always)]
    fn emit_literal(&mut self, tt: TokenType, literal: Literal) {
        self.pending = Some((tt, Some(literal)));
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`.  A recognised token is
    /// left in `self.pending`; whitespace and comments leave it `None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.emit(TokenType::LEFT_PAREN),
            b')' => self.emit(TokenType::RIGHT_PAREN),
            b'{' => self.emit(TokenType::LEFT_BRACE),
            b'}' => self.emit(TokenType::RIGHT_BRACE),
            b',' => self.emit(TokenType::COMMA),
            b'.' => self.emit(TokenType::DOT),
            b'-' => self.emit(TokenType::MINUS),
            b'+' => self.emit(TokenType::PLUS),
            b';' => self.emit(TokenType::SEMICOLON),
            b'*' => self.emit(TokenType::STAR),
            b'?' => self.emit(TokenType::QUESTION),
            b':' => self.emit(TokenType::COLON),

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.emit(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.emit(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.emit(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.emit(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {}

            b'\n' => self.newline_at(self.curr - 1),

            // ── comments and slash ───────────────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    self.skip_line_comment();
                } else if self.match_byte(b'*') {
                    return self.skip_block_comment();
                } else {
                    self.emit(TokenType::SLASH);
                }
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => return self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Step over the whole character so slicing stays on a
                // UTF‑8 boundary.
                let ch: char = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + ch.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    self.column_of(self.start),
                    format!("Unexpected character: {}", ch),
                ));
            }
        }

        Ok(())
    }

    /// `//` comment: fast‑forward to the next newline (left for the main
    /// loop so the line counter sees it) or to EOF.
    fn skip_line_comment(&mut self) {
        match memchr(b'\n', &self.bytes()[self.curr..]) {
            Some(pos) => self.curr += pos,
            None => self.curr = self.src.len(),
        }
    }

    /// `/* … */` comment.  Newlines inside still advance the line counter.
    fn skip_block_comment(&mut self) -> Result<()> {
        let open_line = self.line;
        let open_column = self.column_of(self.start);

        let rest: &[u8] = &self.bytes()[self.curr..];

        let (body_len, terminated) = match memmem::find(rest, b"*/") {
            Some(pos) => (pos, true),
            None => (rest.len(), false),
        };

        let body_start = self.curr;
        let body: &[u8] = &rest[..body_len];

        if let Some(last) = memrchr(b'\n', body) {
            self.line += memchr_iter(b'\n', body).count();
            self.line_start = body_start + last + 1;
        }

        if !terminated {
            self.curr = self.src.len();

            debug!("Unterminated comment opened on line {}", open_line);

            return Err(LoxError::lex(
                open_line,
                open_column,
                "Unterminated comment.",
            ));
        }

        self.curr = body_start + body_len + 2;

        Ok(())
    }

    /// Parse a double‑quoted string literal.  `self.start` points to the
    /// opening `"`; on success `self.curr` is past the closing `"`.
    fn parse_string(&mut self) -> Result<()> {
        let line = self.line;
        let column = self.column_of(self.start);

        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.newline_at(self.curr - 1);
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(line, column, "Unterminated string."));
        }

        self.advance(); // closing quote

        let s: &str = &self.src[self.start + 1..self.curr - 1];

        self.emit_literal(TokenType::STRING, Literal::Str(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  A trailing `.` with no digit
    /// after it is left for the next token.
    fn parse_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.src[self.start..self.curr];
        let n: f64 = s.parse::<f64>().map_err(|e| {
            LoxError::lex(
                self.line,
                self.column_of(self.start),
                format!("Invalid number '{}': {}", s, e),
            )
        })?;

        self.emit_literal(TokenType::NUMBER, Literal::Number(n));

        Ok(())
    }

    /// Identifier or reserved word.  `true`, `false` and `nil` also carry
    /// their literal value.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.bytes()[self.start..self.curr];

        match KEYWORDS.get(slice).copied() {
            Some(TokenType::TRUE) => self.emit_literal(TokenType::TRUE, Literal::Bool(true)),
            Some(TokenType::FALSE) => self.emit_literal(TokenType::FALSE, Literal::Bool(false)),
            Some(TokenType::NIL) => self.emit_literal(TokenType::NIL, Literal::Nil),
            Some(tt) => self.emit(tt),
            None => self.emit(TokenType::IDENTIFIER),
        }
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.curr;
            self.pending = None;

            let line = self.line;
            let column = self.column_of(self.start);

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some((tt, literal)) = self.pending.take() {
                let lexeme: &str = &self.src[self.start..self.curr];

                debug!("Scanned token ({:?}) on line {}", tt, line);

                return Some(Ok(Token::new(tt, lexeme, literal, line, column)));
            }
        }

        // Emit exactly one EOF, then stay exhausted.
        self.done = true;

        let column = self.column_of(self.curr);

        Some(Ok(Token::new(TokenType::EOF, "", None, self.line, column)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
