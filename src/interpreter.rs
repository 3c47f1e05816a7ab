use std::io::Write;

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{LoxError, Result, RuntimeErrorKind};
use crate::expr::{BinaryOp, Expr, ExprVisitor, Operator};
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Tree‑walking evaluator.  `print` output goes to `out`.
pub struct Interpreter<W: Write> {
    environment: Environment,
    out: W,
}

impl<W: Write> Interpreter<W> {
    /// Interpreter with a fresh root scope, printing to `out`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        Self {
            environment: Environment::new(),
            out,
        }
    }

    /// Read access to the variable scopes, e.g. for the AST printer.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs a program.  Returns the value of the last statement, or the
    /// first runtime error; statements after the error are not run.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Value> {
        debug!("Interpreting {} statements", statements.len());

        let value = self.execute_all(statements)?;

        info!("Interpretation completed successfully");

        Ok(value)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Value> {
        stmt.accept(self)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        let value = expr.accept(self)?;

        debug!("Expression evaluated to: {}", value);

        Ok(value)
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Value> {
        let mut last: Value = Value::Nil;

        for stmt in statements {
            debug!("Executing statement: {:?}", stmt);

            last = self.execute(stmt)?;
        }

        Ok(last)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

impl<W: Write> StmtVisitor for Interpreter<W> {
    type Output = Result<Value>;

    fn visit_expression_stmt(&mut self, expr: &Expr) -> Result<Value> {
        debug!("Evaluating expression statement");

        self.evaluate(expr)
    }

    fn visit_print_stmt(&mut self, expr: &Expr) -> Result<Value> {
        debug!("Evaluating print statement");

        let value = self.evaluate(expr)?;
        writeln!(self.out, "{}", value)?;

        info!("Printed value: {}", value);

        Ok(Value::Nil)
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> Result<Value> {
        debug!("Defining variable '{}'", name.lexeme);

        let value = match initializer {
            Some(expr) => self.evaluate(expr)?,
            None => {
                debug!("No initializer, using Nil");
                Value::Nil
            }
        };

        self.environment.define(&name.lexeme, value);

        Ok(Value::Nil)
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> Result<Value> {
        debug!("Entering block with {} statements", statements.len());

        self.environment.push_scope();
        let result = self.execute_all(statements);
        // Restore before propagating so an error never leaves the inner scope current.
        self.environment.pop_scope();

        info!("Exited block");

        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

impl<W: Write> ExprVisitor for Interpreter<W> {
    type Output = Result<Value>;

    fn visit_literal(&mut self, token: &Token) -> Result<Value> {
        match &token.literal {
            Some(literal) => Ok(Value::from(literal)),
            None => Err(LoxError::runtime(
                RuntimeErrorKind::TypeMismatch,
                token,
                format!("Invalid literal '{}'.", token.lexeme),
            )),
        }
    }

    fn visit_variable(&mut self, name: &Token) -> Result<Value> {
        debug!("Looking up variable '{}'", name.lexeme);

        self.environment.get(name)
    }

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Result<Value> {
        let value = self.evaluate(value)?;

        self.environment.assign(name, value.clone())?;

        info!("Assigned value {} to '{}'", value, name.lexeme);

        Ok(value)
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        debug!("Evaluating unary operation: {}", operator.lexeme);

        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(LoxError::runtime(
                    RuntimeErrorKind::TypeMismatch,
                    operator,
                    format!("Operand must be a number, got {}.", other.type_name()),
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(LoxError::runtime(
                RuntimeErrorKind::TypeMismatch,
                operator,
                format!("Unknown unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Operator, right: &Expr) -> Result<Value> {
        debug!("Evaluating binary operation: {}", operator.token.lexeme);

        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        let token: &Token = &operator.token;

        match (operator.op, left, right) {
            (BinaryOp::Comma, _, right) => Ok(right),

            (BinaryOp::Equal, left, right) => Ok(Value::Bool(left == right)),
            (BinaryOp::NotEqual, left, right) => Ok(Value::Bool(left != right)),

            (BinaryOp::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (BinaryOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (BinaryOp::Add, a, b) => Err(LoxError::runtime(
                RuntimeErrorKind::TypeMismatch,
                token,
                format!(
                    "Operands must be two numbers or two strings, got {} and {}.",
                    a.type_name(),
                    b.type_name()
                ),
            )),

            (BinaryOp::Divide, Value::Number(_), Value::Number(b)) if b == 0.0 => {
                Err(LoxError::runtime(
                    RuntimeErrorKind::DivisionByZero,
                    token,
                    "Division by zero.",
                ))
            }

            (BinaryOp::Subtract, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
            (BinaryOp::Multiply, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
            (BinaryOp::Divide, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
            (BinaryOp::Greater, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
            (BinaryOp::GreaterEqual, Value::Number(a), Value::Number(b)) => {
                Ok(Value::Bool(a >= b))
            }
            (BinaryOp::Less, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
            (BinaryOp::LessEqual, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

            (_, a, b) => Err(LoxError::runtime(
                RuntimeErrorKind::TypeMismatch,
                token,
                format!(
                    "Operands must be numbers, got {} and {}.",
                    a.type_name(),
                    b.type_name()
                ),
            )),
        }
    }

    fn visit_ternary(&mut self, condition: &Expr, left: &Expr, right: &Expr) -> Result<Value> {
        let condition = self.evaluate(condition)?;

        // Only the taken branch is evaluated.
        if condition.is_truthy() {
            self.evaluate(left)
        } else {
            self.evaluate(right)
        }
    }

    fn visit_grouping(&mut self, inner: &Expr) -> Result<Value> {
        self.evaluate(inner)
    }
}
