#[cfg(test)]
mod session_tests {
    use loxwalk as lox;

    use lox::error::{CollectingReporter, LoxError, Phase};
    use lox::session::{normalize_input, Session, SessionOptions};
    use lox::value::Value;

    fn output(session: Session<Vec<u8>>) -> String {
        String::from_utf8(session.into_output()).expect("utf-8 output")
    }

    #[test]
    fn bindings_persist_across_runs() {
        let mut session = Session::new(Vec::new(), SessionOptions::default());
        let mut reporter = CollectingReporter::new();

        session.run("var x = 10;", &mut reporter).expect("define");
        session.run("x = x + 5;", &mut reporter).expect("assign");
        let value = session.run("x;", &mut reporter).expect("read");

        assert_eq!(value, Value::Number(15.0));
        assert!(reporter.diagnostics.is_empty());
    }

    #[test]
    fn failed_run_keeps_earlier_bindings() {
        let mut session = Session::new(Vec::new(), SessionOptions::default());
        let mut reporter = CollectingReporter::new();

        session.run("var a = 1;", &mut reporter).expect("define");

        // The first statement commits before the runtime error.
        assert!(session.run("var b = 2; missing;", &mut reporter).is_err());

        assert_eq!(session.run("a + b;", &mut reporter).ok(), Some(Value::Number(3.0)));
    }

    #[test]
    fn lexical_error_runs_nothing() {
        let mut session = Session::new(Vec::new(), SessionOptions::default());
        let mut reporter = CollectingReporter::new();

        let result = session.run("print 1; $", &mut reporter);

        assert!(matches!(
            result,
            Err(LoxError::Aborted {
                phase: Phase::Scan,
                errors: 1
            })
        ));
        assert_eq!(reporter.messages(), vec!["Unexpected character: $"]);
        assert_eq!(output(session), "");
    }

    #[test]
    fn syntax_error_runs_nothing() {
        let mut session = Session::new(Vec::new(), SessionOptions::default());
        let mut reporter = CollectingReporter::new();

        let result = session.run("var x = 1; print x; print ;", &mut reporter);

        assert!(matches!(
            result,
            Err(LoxError::Aborted {
                phase: Phase::Parse,
                errors: 1
            })
        ));
        assert!(session.interpreter().environment().lookup("x").is_none());
        assert_eq!(output(session), "");
    }

    #[test]
    fn normalize_input_appends_missing_semicolon() {
        assert_eq!(normalize_input("1 + 2"), "1 + 2;");
        assert_eq!(normalize_input("  print x;  "), "print x;");
        assert_eq!(normalize_input("{ var y = 1; }"), "{ var y = 1; }");
        assert_eq!(normalize_input(""), ";");
    }

    #[test]
    fn show_tokens_dumps_before_running() {
        let options = SessionOptions {
            show_tokens: true,
            ..Default::default()
        };
        let mut session = Session::new(Vec::new(), options);
        let mut reporter = CollectingReporter::new();

        session.run("print 1;", &mut reporter).expect("run");

        assert_eq!(
            output(session),
            "[Token(PRINT, \"print\", null) Token(NUMBER, \"1\", 1.0) \
             Token(SEMICOLON, \";\", null) Token(EOF, \"\", null)]\n1\n"
        );
    }

    #[test]
    fn show_ast_uses_current_bindings() {
        let mut session = Session::new(Vec::new(), SessionOptions::default());
        let mut reporter = CollectingReporter::new();

        session.run("var s = \"hi\";", &mut reporter).expect("define");
        session.options.show_ast = true;
        session.run("s;", &mut reporter).expect("read");

        assert_eq!(output(session), "ExpressionStatement: \n\tVariable: s = \"hi\"\n");
    }

    #[test]
    fn show_source_echoes_input() {
        let options = SessionOptions {
            show_source: true,
            ..Default::default()
        };
        let mut session = Session::new(Vec::new(), options);
        let mut reporter = CollectingReporter::new();

        session.run("print 2;", &mut reporter).expect("run");

        assert_eq!(output(session), "print 2;\n2\n");
    }

    #[test]
    fn set_command_toggles_options() {
        let mut options = SessionOptions::default();

        assert!(options.apply_set_command("\\set showAst 1").is_ok());
        assert!(options.show_ast);

        assert!(options.apply_set_command("\\set showTokens 1").is_ok());
        assert!(options.apply_set_command("\\set showTokens 0").is_ok());
        assert!(!options.show_tokens);

        assert!(options.apply_set_command("\\set showSource 1").is_ok());
        assert!(options.show_source);
    }

    #[test]
    fn set_command_rejects_bad_input() {
        let mut options = SessionOptions::default();

        assert_eq!(
            options.apply_set_command("\\set showAst"),
            Err("Invalid set command".to_string())
        );
        assert_eq!(
            options.apply_set_command("\\set showAst yes"),
            Err("Invalid set command: \\set showAst yes".to_string())
        );
        assert_eq!(
            options.apply_set_command("\\set colour 1"),
            Err("Invalid set command: \\set colour 1".to_string())
        );
        assert_eq!(options, SessionOptions::default());
    }
}
