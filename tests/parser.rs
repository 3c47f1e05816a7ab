#[cfg(test)]
mod parser_tests {
    use loxwalk as lox;

    use lox::ast_printer::AstPrinter;
    use lox::environment::Environment;
    use lox::error::{CollectingReporter, LoxError, Phase};
    use lox::expr::{BinaryOp, Expr};
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::stmt::Stmt;
    use lox::token::{Literal, TokenType};
    use lox::value::Value;

    fn parse(source: &str) -> (Result<Vec<Stmt>, LoxError>, CollectingReporter) {
        let mut reporter = CollectingReporter::new();
        let tokens = Scanner::new(source)
            .scan_tokens(&mut reporter)
            .expect("test source should scan");
        let result = Parser::new(tokens, &mut reporter).parse();

        (result, reporter)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (result, reporter) = parse(source);

        assert!(
            reporter.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            reporter.diagnostics
        );
        result.expect("source should parse")
    }

    fn single_expr(source: &str) -> Expr {
        match parse_ok(source).pop() {
            Some(Stmt::Expression(expr)) => expr,
            other => panic!("expected one expression statement, got {:?}", other),
        }
    }

    fn binary_op(expr: &Expr) -> BinaryOp {
        match expr {
            Expr::Binary { operator, .. } => operator.op,
            other => panic!("expected binary, got {:?}", other),
        }
    }

    fn number(expr: &Expr) -> f64 {
        match expr {
            Expr::Literal(token) => match token.literal {
                Some(Literal::Number(n)) => n,
                _ => panic!("expected number literal, got {:?}", token),
            },
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        let expr = single_expr("1 + 2 * 3;");

        let Expr::Binary { left, operator, right } = &expr else {
            panic!("expected binary");
        };

        assert_eq!(operator.op, BinaryOp::Add);
        assert_eq!(number(left), 1.0);
        assert_eq!(binary_op(right), BinaryOp::Multiply);
    }

    #[test]
    fn grouping_overrides_precedence() {
        let expr = single_expr("(1 + 2) * 3;");

        let Expr::Binary { left, operator, .. } = &expr else {
            panic!("expected binary");
        };

        assert_eq!(operator.op, BinaryOp::Multiply);
        assert!(matches!(left.as_ref(), Expr::Grouping(inner) if binary_op(inner) == BinaryOp::Add));
    }

    #[test]
    fn binary_operators_fold_left() {
        let expr = single_expr("1 - 2 - 3;");

        let Expr::Binary { left, right, .. } = &expr else {
            panic!("expected binary");
        };

        assert_eq!(binary_op(left), BinaryOp::Subtract);
        assert_eq!(number(right), 3.0);
    }

    #[test]
    fn comma_expression_is_ternary_condition() {
        let expr = single_expr("a, b ? c : d;");

        let Expr::Ternary { condition, left, right } = &expr else {
            panic!("expected ternary, got {:?}", expr);
        };

        assert_eq!(binary_op(condition), BinaryOp::Comma);
        assert!(matches!(left.as_ref(), Expr::Variable(t) if t.lexeme == "c"));
        assert!(matches!(right.as_ref(), Expr::Variable(t) if t.lexeme == "d"));
    }

    #[test]
    fn ternary_is_right_associative() {
        let expr = single_expr("a ? b : c ? d : e;");

        let Expr::Ternary { condition, right, .. } = &expr else {
            panic!("expected ternary");
        };

        assert!(matches!(condition.as_ref(), Expr::Variable(t) if t.lexeme == "a"));
        assert!(matches!(right.as_ref(), Expr::Ternary { .. }));
    }

    #[test]
    fn equality_binds_tighter_than_comma() {
        let expr = single_expr("1 == 2, 3 < 4;");

        let Expr::Binary { left, operator, right } = &expr else {
            panic!("expected binary");
        };

        assert_eq!(operator.op, BinaryOp::Comma);
        assert_eq!(binary_op(left), BinaryOp::Equal);
        assert_eq!(binary_op(right), BinaryOp::Less);
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = single_expr("a = b = 1;");

        let Expr::Assign { name, value } = &expr else {
            panic!("expected assignment");
        };

        assert_eq!(name.lexeme, "a");
        assert!(matches!(value.as_ref(), Expr::Assign { name, .. } if name.lexeme == "b"));
    }

    #[test]
    fn unary_nests() {
        let expr = single_expr("!-x;");

        let Expr::Unary { operator, right } = &expr else {
            panic!("expected unary");
        };

        assert_eq!(operator.token_type, TokenType::BANG);
        assert!(matches!(right.as_ref(), Expr::Unary { operator, .. } if operator.is(TokenType::MINUS)));
    }

    #[test]
    fn statements_and_blocks() {
        let statements = parse_ok("var x; var y = 2; print y; { x = 1; { x; } }");

        assert_eq!(statements.len(), 4);
        assert!(matches!(&statements[0], Stmt::Var { name, initializer: None } if name.lexeme == "x"));
        assert!(matches!(&statements[1], Stmt::Var { initializer: Some(_), .. }));
        assert!(matches!(&statements[2], Stmt::Print(Expr::Variable(_))));

        let Stmt::Block(inner) = &statements[3] else {
            panic!("expected block");
        };

        assert_eq!(inner.len(), 2);
        assert!(matches!(&inner[0], Stmt::Expression(Expr::Assign { .. })));
        assert!(matches!(&inner[1], Stmt::Block(b) if b.len() == 1));
    }

    #[test]
    fn empty_program_parses_to_nothing() {
        assert!(parse_ok("").is_empty());
        assert!(parse_ok("// only a comment").is_empty());
    }

    #[test]
    fn invalid_assignment_target() {
        let (result, reporter) = parse("1 = 2;");

        assert!(matches!(
            result,
            Err(LoxError::Aborted {
                phase: Phase::Parse,
                errors: 1
            })
        ));
        assert_eq!(
            reporter.diagnostics[0].to_string(),
            "[line 1, col 3] Error at '=': Invalid assignment target."
        );
    }

    #[test]
    fn missing_semicolon_at_end_of_input() {
        let (result, reporter) = parse("print 1");

        assert!(result.is_err());
        assert_eq!(reporter.diagnostics.len(), 1);
        assert_eq!(reporter.diagnostics[0].lexeme, None);
        assert_eq!(
            reporter.diagnostics[0].message,
            "Unexpected end of input. Expected ';' after value."
        );
    }

    #[test]
    fn unclosed_block_and_group() {
        let (_, reporter) = parse("{ var x = 1;");
        assert_eq!(
            reporter.messages(),
            vec!["Unexpected end of input. Expected '}' after block."]
        );

        let (_, reporter) = parse("(1 + 2;");
        assert_eq!(reporter.messages(), vec!["Expected ')' after expression."]);

        let (_, reporter) = parse("a ? b;");
        assert_eq!(reporter.messages(), vec!["Expected ':' in ternary expression."]);
    }

    #[test]
    fn recovery_reports_every_statement_error() {
        let (result, reporter) = parse("var = 1; print ; var ok = 2;");

        assert!(matches!(
            result,
            Err(LoxError::Aborted {
                phase: Phase::Parse,
                errors: 2
            })
        ));
        assert_eq!(
            reporter.messages(),
            vec!["Expected variable name.", "Expected expression."]
        );
        assert_eq!(reporter.diagnostics[0].lexeme.as_deref(), Some("="));
        assert_eq!(
            (reporter.diagnostics[1].line, reporter.diagnostics[1].column),
            (1, 16)
        );
    }

    #[test]
    fn recovery_stops_at_statement_keyword() {
        let (_, reporter) = parse("1 + ;\nprint 2 3;\nvar x = 1;");

        // `1 + ;` fails at ';', `print 2 3` fails at '3'; the var is clean.
        assert_eq!(
            reporter.messages(),
            vec!["Expected expression.", "Expected ';' after value."]
        );
        assert_eq!(reporter.diagnostics[1].line, 2);
    }

    #[test]
    fn error_inside_block_is_reported_once() {
        let (result, reporter) = parse("{ var = 1; print 2; }");

        assert!(matches!(
            result,
            Err(LoxError::Aborted {
                phase: Phase::Parse,
                errors: 1
            })
        ));
        assert_eq!(
            reporter
                .diagnostics
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>(),
            vec!["[line 1, col 7] Error at '=': Expected variable name."]
        );
    }

    #[test]
    fn block_recovery_resumes_after_the_block() {
        let (_, reporter) = parse("{ print ; }\nvar y = 2;");
        assert_eq!(reporter.messages(), vec!["Expected expression."]);

        let (_, reporter) = parse("{ var = 1 }\nprint 2;");
        assert_eq!(reporter.messages(), vec!["Expected variable name."]);

        let (_, reporter) = parse("{ 1 + }");
        assert_eq!(reporter.messages(), vec!["Expected expression."]);
        assert_eq!(reporter.diagnostics[0].lexeme.as_deref(), Some("}"));

        let (_, reporter) = parse("{ { print ; } print ; }");
        assert_eq!(
            reporter.messages(),
            vec!["Expected expression.", "Expected expression."]
        );
        assert_eq!(reporter.diagnostics[1].column, 21);
    }

    #[test]
    fn block_error_at_end_of_input_is_reported_once() {
        let (_, reporter) = parse("{ print 1");

        assert_eq!(
            reporter.messages(),
            vec!["Unexpected end of input. Expected ';' after value."]
        );
    }

    #[test]
    fn stray_closing_brace_is_reported_once() {
        let (result, reporter) = parse("print 1; } print 2;");

        assert!(result.is_err());
        assert_eq!(reporter.messages(), vec!["Expected expression."]);
        assert_eq!(reporter.diagnostics[0].column, 10);
    }

    #[test]
    fn printer_renders_indented_tree() {
        let statements = parse_ok("var x = 1 + 2;");
        let rendered = AstPrinter::new().print(&statements);

        assert_eq!(
            rendered,
            vec![
                "VarDeclarationStatement: \n\tName: x\n\tValue: Binary: +\n\t\tLeft  -> Literal: 1\n\t\tRight -> Literal: 2"
            ]
        );
    }

    #[test]
    fn printer_shows_bound_values_without_mutating() {
        let statements = parse_ok("x; y;");

        let mut env = Environment::new();
        env.define("x", Value::String("hi".into()));

        let rendered = AstPrinter::with_environment(&env).print(&statements);

        assert_eq!(rendered[0], "ExpressionStatement: \n\tVariable: x = \"hi\"");
        assert_eq!(rendered[1], "ExpressionStatement: \n\tVariable: y = <unbound>");
        assert_eq!(env.globals().len(), 1);
    }

    #[test]
    fn printer_handles_blocks_and_grouping() {
        let statements = parse_ok("{ print (1); }");
        let rendered = AstPrinter::new().print(&statements);

        assert_eq!(
            rendered[0],
            "BlockStatement: {\n\tPrintStatement: \n\t\tGrouping: (\n\t\t\tLiteral: 1\n\t\t)\n}"
        );
    }
}
