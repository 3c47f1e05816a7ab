use serde::Serialize;

use crate::expr::Expr;
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    // Evaluated for side effects
    Expression(Expr),

    Print(Expr),

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    // Runs in a fresh nested scope
    Block(Vec<Stmt>),
}

pub trait StmtVisitor {
    type Output;

    fn visit_expression_stmt(&mut self, expr: &Expr) -> Self::Output;

    fn visit_print_stmt(&mut self, expr: &Expr) -> Self::Output;

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> Self::Output;

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> Self::Output;
}

impl Stmt {
    pub fn accept<V: StmtVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Stmt::Expression(expr) => visitor.visit_expression_stmt(expr),
            Stmt::Print(expr) => visitor.visit_print_stmt(expr),
            Stmt::Var { name, initializer } => visitor.visit_var_stmt(name, initializer.as_ref()),
            Stmt::Block(statements) => visitor.visit_block_stmt(statements),
        }
    }
}
