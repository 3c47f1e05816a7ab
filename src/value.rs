use serde::Serialize;

use crate::token::Literal;

/// A runtime value.  Closed set: every operator matches it exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
        }
    }

    /// Display form for an interactive prompt: like `Display`, but strings
    /// are quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s),
            other => other.to_string(),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::String(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Nil => Value::Nil,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),
        }
    }
}
