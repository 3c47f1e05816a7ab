//! One logical execution: a file run or an interactive session.
//!
//! A [`Session`] owns the interpreter, and with it the root environment, so
//! bindings made by one [`Session::run`] call are visible to the next.  Each
//! call drives the whole pipeline: scan → parse → (print AST) → interpret.
//! A failing stage stops that call; earlier bindings survive it.

use std::io::Write;

use log::{debug, info};

use crate::ast_printer::AstPrinter;
use crate::error::{Reporter, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::value::Value;

/// Debug dumps written to the session output before execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub show_tokens: bool,
    pub show_ast: bool,
    pub show_source: bool,
}

impl SessionOptions {
    /// Set a flag by its interactive name.  Returns `false` for an unknown name.
    pub fn set(&mut self, name: &str, value: bool) -> bool {
        match name {
            "showTokens" => self.show_tokens = value,
            "showAst" => self.show_ast = value,
            "showSource" => self.show_source = value,
            _ => return false,
        }

        true
    }

    /// Apply a `\set <name> <0|1>` line.  The error is the message to show.
    pub fn apply_set_command(&mut self, line: &str) -> std::result::Result<(), String> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        let [_, name, flag] = parts.as_slice() else {
            return Err("Invalid set command".to_string());
        };

        let value = match *flag {
            "1" => true,
            "0" => false,
            _ => return Err(format!("Invalid set command: \\set {} {}", name, flag)),
        };

        if !self.set(name, value) {
            return Err(format!("Invalid set command: \\set {} {}", name, flag));
        }

        debug!("Option {} set to {}", name, value);

        Ok(())
    }
}

/// Appends the `;` an interactive line usually leaves off.  Input that
/// already ends in `;` or `}` is only trimmed.
pub fn normalize_input(line: &str) -> String {
    let trimmed = line.trim();

    if trimmed.ends_with(';') || trimmed.ends_with('}') {
        trimmed.to_string()
    } else {
        format!("{};", trimmed)
    }
}

pub struct Session<W: Write> {
    interpreter: Interpreter<W>,
    pub options: SessionOptions,
}

impl<W: Write> Session<W> {
    pub fn new(out: W, options: SessionOptions) -> Self {
        info!("Session started with {:?}", options);

        Self {
            interpreter: Interpreter::with_output(out),
            options,
        }
    }

    pub fn interpreter(&self) -> &Interpreter<W> {
        &self.interpreter
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }

    /// Runs `source` against the session's root environment.
    ///
    /// Lexical and syntax errors go to `reporter` and come back as
    /// `LoxError::Aborted`; runtime errors come back whole.
    pub fn run(&mut self, source: &str, reporter: &mut dyn Reporter) -> Result<Value> {
        if self.options.show_source {
            writeln!(self.out(), "{}", source)?;
        }

        let tokens = Scanner::new(source).scan_tokens(reporter)?;

        if self.options.show_tokens {
            let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            writeln!(self.out(), "[{}]", rendered.join(" "))?;
        }

        let statements = Parser::new(tokens, reporter).parse()?;

        debug!("Running {} statements", statements.len());

        if self.options.show_ast {
            let trees = AstPrinter::with_environment(self.interpreter.environment())
                .print(&statements);

            for tree in trees {
                writeln!(self.out(), "{}", tree)?;
            }
        }

        self.interpreter.interpret(&statements)
    }

    fn out(&mut self) -> &mut W {
        self.interpreter.output_mut()
    }
}
