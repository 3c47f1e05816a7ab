use log::debug;
use serde::Serialize;
use std::fmt;

/// The different kinds of tokens recognized by the scanner.
///
/// Literal payloads are not carried here; they live in [`Token::literal`] so
/// the kind stays a plain `Copy` tag that can be matched and hashed freely.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '?'
    QUESTION,

    /// ':'
    COLON,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal
    STRING,

    /// A numeric literal
    NUMBER,

    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Upper‑case variant name, as printed in token dumps.
    pub fn name(self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::QUESTION => "QUESTION",
            TokenType::COLON => "COLON",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING => "STRING",
            TokenType::NUMBER => "NUMBER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }

    /// Keywords that open a statement. Used by the parser to find a
    /// recovery point after a syntax error.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value decoded by the scanner from a literal lexeme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal, the verbatim text between the quotes.
    Str(String),

    /// `true` / `false`
    Bool(bool),

    /// `nil`
    Nil,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // 3 → "3.0", 3.14 → "3.14"
            Literal::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{}.0", buf.format(*n as i64))
            }
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Str(s) => f.write_str(s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Nil => f.write_str("nil"),
        }
    }
}

/// A scanned token: its kind, the exact lexeme, an optional decoded
/// literal, and the 1‑based position of its first character.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// Decoded value for NUMBER, STRING, TRUE, FALSE and NIL tokens.
    pub literal: Option<Literal>,

    /// 1‑based line number in the source.
    pub line: usize,

    /// 1‑based column of the first character on its line.
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        line: usize,
        column: usize,
    ) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}, col={}",
            token_type, lexeme, line, column
        );

        Self {
            token_type,
            lexeme,
            literal,
            line,
            column,
        }
    }

    #[inline]
    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(literal) => write!(
                f,
                "Token({}, \"{}\", {})",
                self.token_type, self.lexeme, literal
            ),
            None => write!(f, "Token({}, \"{}\", null)", self.token_type, self.lexeme),
        }
    }
}
