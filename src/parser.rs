/*!
Recursive‑descent parser: token sequence → statement list.

One token of lookahead (`peek`), no backtracking.  Each grammar rule below is
one method; precedence is encoded by which method calls which.

```text
program     → statement* EOF ;
statement   → "var" IDENT ( "=" assignment )? ";"
            | "print" expression ";"
            | "{" statement* "}"
            | expression ";" ;
expression  → assignment ;
assignment  → IDENT "=" assignment | ternary ;
ternary     → comma ( "?" ternary ":" ternary )? ;
comma       → equality ( "," equality )* ;
equality    → comparison ( ( "!=" | "==" ) comparison )* ;
comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term        → factor ( ( "-" | "+" ) factor )* ;
factor      → unary ( ( "/" | "*" ) unary )* ;
unary       → ( "!" | "-" ) unary | primary ;
primary     → NUMBER | STRING | "true" | "false" | "nil"
            | IDENT | "(" expression ")" ;
```

Note that the comma rule sits *below* ternary, so `a, b ? c : d` takes
`(a, b)` as its condition.

### Errors

Every syntax error is sent to the [`Reporter`] when it is created.  The
enclosing statement loop (top level or block) then calls `synchronize()` and
keeps going, so one pass reports every error it can find; if any were reported the parse as a whole
fails with `LoxError::Aborted` and no statements are returned.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `statement`, `synchronize`   | `debug`| High‑level descent and recovery.          |
*/

use crate::error::{LoxError, Phase, Reporter, Result};
use crate::expr::{BinaryOp, Expr, Operator};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Top‑level parser over an owned token sequence.
pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    reporter: &'r mut dyn Reporter,
    errors: usize,
}

impl<'r> Parser<'r> {
    /// Construct a new parser.  A missing trailing `EOF` is supplied so
    /// lookahead never runs off the end.
    pub fn new(mut tokens: Vec<Token>, reporter: &'r mut dyn Reporter) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if !tokens.last().is_some_and(|t| t.is(TokenType::EOF)) {
            let (line, column) = tokens
                .last()
                .map(|t| (t.line, t.column + t.lexeme.len()))
                .unwrap_or((1, 1));

            tokens.push(Token::new(TokenType::EOF, "", None, line, column));
        }

        Self {
            tokens,
            current: 0,
            reporter,
            errors: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    debug!("Recovering from: {}", e);

                    self.synchronize();

                    // No block is open here, so a `}` left in front of us is stray.
                    if self.check(TokenType::RIGHT_BRACE) {
                        self.advance();
                    }
                }
            }
        }

        if self.errors > 0 {
            info!("Parse failed with {} error(s)", self.errors);

            return Err(LoxError::Aborted {
                phase: Phase::Parse,
                errors: self.errors,
            });
        }

        info!("Parsed {} statements", statements.len());

        Ok(statements)
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {:?}", self.peek().token_type);

        if self.matches(&[TokenType::VAR]) {
            self.var_declaration()
        } else if self.matches(&[TokenType::PRINT]) {
            self.print_statement()
        } else if self.matches(&[TokenType::LEFT_BRACE]) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected variable name.")?
            .clone();

        let initializer: Option<Expr> = if self.matches(&[TokenType::EQUAL]) {
            Some(self.assignment()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                // Nothing left to recover into; the missing `}` is implied.
                Err(e) if self.is_at_end() => return Err(e),
                Err(e) => {
                    debug!("Recovering inside block from: {}", e);

                    self.synchronize();
                }
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block.")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.ternary()?;

        if self.matches(&[TokenType::EQUAL]) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                }),

                _ => Err(self.error(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr> {
        let condition: Expr = self.comma()?;

        if self.matches(&[TokenType::QUESTION]) {
            let left: Expr = self.ternary()?;

            self.consume(TokenType::COLON, "Expected ':' in ternary expression.")?;

            let right: Expr = self.ternary()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(condition)
    }

    fn comma(&mut self) -> Result<Expr> {
        self.binary_left_assoc(&[TokenType::COMMA], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_left_assoc(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_left_assoc(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_left_assoc(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_left_assoc(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    /// `operand ( op operand )*`, folded to the left.
    fn binary_left_assoc(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = operand(self)?;

        while self.matches(operators) {
            let token: Token = self.previous().clone();
            let right: Expr = operand(self)?;

            let Some(op) = BinaryOp::from_token_type(token.token_type) else {
                return Err(self.error(&token, "Unknown binary operator."));
            };

            expr = Expr::Binary {
                left: Box::new(expr),
                operator: Operator { op, token },
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(&[TokenType::BANG, TokenType::MINUS]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(&[
            TokenType::FALSE,
            TokenType::TRUE,
            TokenType::NIL,
            TokenType::NUMBER,
            TokenType::STRING,
        ]) {
            return Ok(Expr::Literal(self.previous().clone()));
        }

        if self.matches(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable(self.previous().clone()));
        }

        if self.matches(&[TokenType::LEFT_PAREN]) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        let token: Token = self.peek().clone();

        Err(self.error(&token, "Expected expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Report a syntax error at `token` and hand back the error value.
    fn error(&mut self, token: &Token, message: &str) -> LoxError {
        let message: String = if token.is(TokenType::EOF) {
            format!("Unexpected end of input. {}", message)
        } else {
            message.to_string()
        };

        self.errors += 1;
        self.reporter
            .report(Some(token), token.line, token.column, &message);

        LoxError::parse(token, message)
    }

    #[inline(always)]
    fn matches(&mut self, types: &[TokenType]) -> bool {
        if types.iter().any(|&tt| self.check(tt)) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        let token: Token = self.peek().clone();

        Err(self.error(&token, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().is(ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().is(TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary: just
    /// past a `;`, or in front of a statement keyword or a closing `}`.
    fn synchronize(&mut self) {
        debug!("Synchronizing from {:?}", self.peek().token_type);

        // Skip the offending token, unless it is the `}` an enclosing block
        // still has to consume.
        if !self.check(TokenType::RIGHT_BRACE) {
            self.advance();
        }

        while !self.is_at_end() {
            if self.previous().is(TokenType::SEMICOLON) {
                return;
            }

            if self.peek().token_type.starts_statement() || self.check(TokenType::RIGHT_BRACE) {
                return;
            }

            self.advance();
        }
    }
}
