use serde::Serialize;

use crate::token::{Token, TokenType};

/// Binary operators, including the comma operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Comma,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn from_token_type(token_type: TokenType) -> Option<Self> {
        let op = match token_type {
            TokenType::COMMA => BinaryOp::Comma,
            TokenType::EQUAL_EQUAL => BinaryOp::Equal,
            TokenType::BANG_EQUAL => BinaryOp::NotEqual,
            TokenType::GREATER => BinaryOp::Greater,
            TokenType::GREATER_EQUAL => BinaryOp::GreaterEqual,
            TokenType::LESS => BinaryOp::Less,
            TokenType::LESS_EQUAL => BinaryOp::LessEqual,
            TokenType::PLUS => BinaryOp::Add,
            TokenType::MINUS => BinaryOp::Subtract,
            TokenType::STAR => BinaryOp::Multiply,
            TokenType::SLASH => BinaryOp::Divide,
            _ => return None,
        };

        Some(op)
    }
}

/// The operator of a [`Expr::Binary`]: its decoded kind plus the token it
/// came from, kept for error positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operator {
    pub op: BinaryOp,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    // Token carries the decoded literal (number, string, bool, nil)
    Literal(Token),

    // Name resolved against the environment chain at evaluation time
    Variable(Token),

    Assign {
        name: Token,
        value: Box<Expr>,
    },

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Operator,
        right: Box<Expr>,
    },

    // condition ? left : right
    Ternary {
        condition: Box<Expr>,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Grouping(Box<Expr>),
}

/// One method per expression variant.  Implementors pick their own output
/// type; the interpreter returns `Result<Value>`, the printer `String`.
pub trait ExprVisitor {
    type Output;

    fn visit_literal(&mut self, token: &Token) -> Self::Output;

    fn visit_variable(&mut self, name: &Token) -> Self::Output;

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Self::Output;

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> Self::Output;

    fn visit_binary(&mut self, left: &Expr, operator: &Operator, right: &Expr) -> Self::Output;

    fn visit_ternary(&mut self, condition: &Expr, left: &Expr, right: &Expr) -> Self::Output;

    fn visit_grouping(&mut self, inner: &Expr) -> Self::Output;
}

impl Expr {
    /// Double dispatch: call the visitor method for this variant.
    pub fn accept<V: ExprVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Literal(token) => visitor.visit_literal(token),
            Expr::Variable(name) => visitor.visit_variable(name),
            Expr::Assign { name, value } => visitor.visit_assign(name, value),
            Expr::Unary { operator, right } => visitor.visit_unary(operator, right),
            Expr::Binary {
                left,
                operator,
                right,
            } => visitor.visit_binary(left, operator, right),
            Expr::Ternary {
                condition,
                left,
                right,
            } => visitor.visit_ternary(condition, left, right),
            Expr::Grouping(inner) => visitor.visit_grouping(inner),
        }
    }
}
