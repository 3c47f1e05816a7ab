use crate::environment::Environment;
use crate::expr::{Expr, ExprVisitor, Operator};
use crate::stmt::{Stmt, StmtVisitor};
use crate::token::Token;

/// Renders statements as an indented tree, one node per line.
///
/// `Variable` nodes are annotated with their current binding, looked up in a
/// borrowed environment snapshot.  The printer only reads that snapshot.
pub struct AstPrinter<'e> {
    depth: usize,
    env: Option<&'e Environment>,
}

impl<'e> AstPrinter<'e> {
    /// Printer with no environment; variables render as `<unbound>`.
    pub fn new() -> Self {
        Self {
            depth: 0,
            env: None,
        }
    }

    pub fn with_environment(env: &'e Environment) -> Self {
        Self {
            depth: 0,
            env: Some(env),
        }
    }

    /// One rendered tree per statement.
    pub fn print(&mut self, statements: &[Stmt]) -> Vec<String> {
        statements.iter().map(|stmt| stmt.accept(self)).collect()
    }

    fn indent(&self) -> String {
        "\t".repeat(self.depth)
    }

    /// Render `f` one level deeper.
    fn nested<F: FnOnce(&mut Self) -> String>(&mut self, f: F) -> String {
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }
}

impl Default for AstPrinter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl StmtVisitor for AstPrinter<'_> {
    type Output = String;

    fn visit_expression_stmt(&mut self, expr: &Expr) -> String {
        self.nested(|p| {
            let rendered = expr.accept(p);
            format!("ExpressionStatement: \n{}{}", p.indent(), rendered)
        })
    }

    fn visit_print_stmt(&mut self, expr: &Expr) -> String {
        self.nested(|p| {
            let rendered = expr.accept(p);
            format!("PrintStatement: \n{}{}", p.indent(), rendered)
        })
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> String {
        self.nested(|p| {
            let value = match initializer {
                Some(expr) => expr.accept(p),
                None => "nil".to_string(),
            };

            format!(
                "VarDeclarationStatement: \n{}Name: {}\n{}Value: {}",
                p.indent(),
                name.lexeme,
                p.indent(),
                value
            )
        })
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> String {
        self.nested(|p| {
            let mut out = String::from("BlockStatement: {");

            for stmt in statements {
                let rendered = stmt.accept(p);
                out.push_str(&format!("\n{}{}", p.indent(), rendered));
            }

            out.push('\n');
            out.push_str(&"\t".repeat(p.depth - 1));
            out.push('}');
            out
        })
    }
}

impl ExprVisitor for AstPrinter<'_> {
    type Output = String;

    fn visit_literal(&mut self, token: &Token) -> String {
        format!("Literal: {}", token.lexeme)
    }

    fn visit_variable(&mut self, name: &Token) -> String {
        match self.env.and_then(|env| env.lookup(&name.lexeme)) {
            Some(value) => format!("Variable: {} = {}", name.lexeme, value.repr()),
            None => format!("Variable: {} = <unbound>", name.lexeme),
        }
    }

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> String {
        format!("Assign: {} = {}", name.lexeme, value.accept(self))
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> String {
        format!("Unary: {} Right -> {}", operator.lexeme, right.accept(self))
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Operator, right: &Expr) -> String {
        self.nested(|p| {
            let left = left.accept(p);
            let right = right.accept(p);

            format!(
                "Binary: {}\n{}Left  -> {}\n{}Right -> {}",
                operator.token.lexeme,
                p.indent(),
                left,
                p.indent(),
                right
            )
        })
    }

    fn visit_ternary(&mut self, condition: &Expr, left: &Expr, right: &Expr) -> String {
        self.nested(|p| {
            let condition = condition.accept(p);
            let left = left.accept(p);
            let right = right.accept(p);

            format!(
                "Ternary: {}\n{}Left  -> {}\n{}Right -> {}",
                condition,
                p.indent(),
                left,
                p.indent(),
                right
            )
        })
    }

    fn visit_grouping(&mut self, inner: &Expr) -> String {
        let body = self.nested(|p| {
            let rendered = inner.accept(p);
            format!("\n{}{}\n", p.indent(), rendered)
        });

        format!("Grouping: ({}{})", body, self.indent())
    }
}
