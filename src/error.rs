//! Centralised error hierarchy for the interpreter.
//!
//! The scanner, parser and runtime all convert their failure modes into one of
//! the variants defined here, giving a uniform `Result<T>` alias throughout the
//! crate and ergonomic inter‑operation with `anyhow` in the binary.
//!
//! Lexical and syntax errors are *reported* through a [`Reporter`] as soon as
//! they are detected; the stage then returns [`LoxError::Aborted`] so the
//! caller knows not to print them a second time. Runtime errors are returned
//! whole and never go through the reporter.
//!
//! The module **does not** decide how diagnostics are displayed.

use std::fmt;
use std::io;

use log::info;
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Which pipeline stage gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scan,
    Parse,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Scan => f.write_str("lexical"),
            Phase::Parse => f.write_str("syntax"),
        }
    }
}

/// Classification of runtime failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// `get` or `assign` on a name no scope in the chain defines.
    UndefinedVariable,

    /// Operand types not accepted by an operator.
    TypeMismatch,

    /// `/` with a zero right‑hand operand.
    DivisionByZero,
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error.
    #[error("[line {line}, col {column}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,

        /// 1‑based column where the offending lexeme starts.
        column: usize,
    },

    /// Syntactic (parser) error.  `lexeme` is `None` at end of input.
    #[error("[line {line}, col {column}] Error {}: {message}", at_lexeme(.lexeme))]
    Parse {
        message: String,
        lexeme: Option<String>,
        line: usize,
        column: usize,
    },

    /// Runtime evaluation error.
    #[error("[line {line}, col {column}] Runtime error: {message}")]
    Runtime {
        kind: RuntimeErrorKind,
        message: String,
        line: usize,
        column: usize,
    },

    /// A stage stopped after reporting `errors` diagnostics through its
    /// [`Reporter`].
    #[error("aborted after {errors} {phase} error(s)")]
    Aborted { phase: Phase, errors: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

fn at_lexeme(lexeme: &Option<String>) -> String {
    match lexeme {
        Some(lexeme) => format!("at '{}'", lexeme),
        None => "at end".to_string(),
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, col={}, msg={}", line, column, message);

        LoxError::Lex {
            message,
            line,
            column,
        }
    }

    /// Helper constructor for the **parser**.  The offending token supplies
    /// the position; an EOF token renders as "at end".
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, col={}, msg={}",
            token.line, token.column, message
        );

        let lexeme = if token.is(TokenType::EOF) {
            None
        } else {
            Some(token.lexeme.clone())
        };

        LoxError::Parse {
            message,
            lexeme,
            line: token.line,
            column: token.column,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(kind: RuntimeErrorKind, token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: kind={:?}, line={}, msg={}",
            kind, token.line, message
        );

        LoxError::Runtime {
            kind,
            message,
            line: token.line,
            column: token.column,
        }
    }

    /// The runtime classification, if this is a runtime error.
    pub fn runtime_kind(&self) -> Option<RuntimeErrorKind> {
        match self {
            LoxError::Runtime { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

// ─────────────────────────────────────────────────────────────────────────────
// Reporting boundary
// ─────────────────────────────────────────────────────────────────────────────

/// Sink for lexical and syntax errors.  Scanner and parser receive one of
/// these instead of writing to the console themselves.
///
/// `token` is `None` for lexical errors, which have no token yet.
pub trait Reporter {
    fn report(&mut self, token: Option<&Token>, line: usize, column: usize, message: &str);
}

/// One captured report.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Lexeme of the offending token; `None` for lexical errors and EOF.
    pub lexeme: Option<String>,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lexeme {
            Some(lexeme) => write!(
                f,
                "[line {}, col {}] Error at '{}': {}",
                self.line, self.column, lexeme, self.message
            ),
            None => write!(
                f,
                "[line {}, col {}] Error: {}",
                self.line, self.column, self.message
            ),
        }
    }
}

impl Diagnostic {
    fn new(token: Option<&Token>, line: usize, column: usize, message: &str) -> Self {
        Self {
            lexeme: token
                .filter(|t| !t.is(TokenType::EOF))
                .map(|t| t.lexeme.clone()),
            line,
            column,
            message: message.to_string(),
        }
    }
}

/// Writes every report to standard error.
#[derive(Debug, Default)]
pub struct StderrReporter {
    reported: usize,
}

impl StderrReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reports written so far.
    pub fn reported(&self) -> usize {
        self.reported
    }
}

impl Reporter for StderrReporter {
    fn report(&mut self, token: Option<&Token>, line: usize, column: usize, message: &str) {
        self.reported += 1;

        eprintln!("{}", Diagnostic::new(token, line, column, message));
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, token: Option<&Token>, line: usize, column: usize, message: &str) {
        self.diagnostics
            .push(Diagnostic::new(token, line, column, message));
    }
}
