//! Lexically scoped variable storage.
//!
//! Scopes live in an arena (`Vec<Scope>`) and point at their parent by index,
//! so a parent link never owns anything.  Blocks push a scope on entry and pop
//! it on exit; the root scope (index 0) is never popped and is what an
//! interactive session carries from one input to the next.

use std::collections::HashMap;

use log::debug;

use crate::error::{LoxError, Result, RuntimeErrorKind};
use crate::token::Token;
use crate::value::Value;

/// Index of a scope in the arena.
pub type ScopeId = usize;

/// The root scope's id.
pub const ROOT: ScopeId = 0;

#[derive(Debug, Clone, Default)]
struct Scope {
    values: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope::default()],
            current: ROOT,
        }
    }

    /// The scope that `define` writes into and lookups start from.
    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Number of live scopes, root included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Open a child of the current scope and make it current.
    pub fn push_scope(&mut self) -> ScopeId {
        let id: ScopeId = self.scopes.len();

        self.scopes.push(Scope {
            values: HashMap::new(),
            parent: Some(self.current),
        });
        self.current = id;

        debug!("Entered scope {}", id);

        id
    }

    /// Drop the current scope and return to its parent.  The root is kept.
    pub fn pop_scope(&mut self) {
        if self.current == ROOT {
            return;
        }

        debug_assert_eq!(self.current, self.scopes.len() - 1);

        if let Some(scope) = self.scopes.pop() {
            debug!("Left scope {}", self.current);

            self.current = scope.parent.unwrap_or(ROOT);
        }
    }

    /// Install `name` in the current scope, overwriting any binding already
    /// there and shadowing outer ones.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define {} = {} in scope {}", name, value, self.current);

        self.scopes[self.current]
            .values
            .insert(name.to_string(), value);
    }

    /// Overwrite `name` in the nearest scope that defines it.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        match self.resolve(&name.lexeme) {
            Some(id) => {
                debug!("assign {} = {} in scope {}", name.lexeme, value, id);

                self.scopes[id].values.insert(name.lexeme.clone(), value);

                Ok(())
            }
            None => Err(undefined(name)),
        }
    }

    /// Value of `name` in the nearest scope that defines it.
    pub fn get(&self, name: &Token) -> Result<Value> {
        self.lookup(&name.lexeme)
            .cloned()
            .ok_or_else(|| undefined(name))
    }

    /// Read‑only chain lookup by plain name.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.resolve(name)
            .and_then(|id| self.scopes[id].values.get(name))
    }

    /// Bindings of the root scope, sorted by name.
    pub fn globals(&self) -> Vec<(&str, &Value)> {
        let mut bindings: Vec<(&str, &Value)> = self.scopes[ROOT]
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();

        bindings.sort_by(|a, b| a.0.cmp(b.0));

        bindings
    }

    fn resolve(&self, name: &str) -> Option<ScopeId> {
        let mut id: Option<ScopeId> = Some(self.current);

        while let Some(i) = id {
            let scope: &Scope = &self.scopes[i];

            if scope.values.contains_key(name) {
                return Some(i);
            }

            id = scope.parent;
        }

        None
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(
        RuntimeErrorKind::UndefinedVariable,
        name,
        format!("Undefined variable '{}'.", name.lexeme),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, None, 1, 1)
    }

    #[test]
    fn inner_define_shadows_without_touching_outer() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0));

        env.push_scope();
        env.define("x", Value::Number(2.0));
        assert_eq!(env.get(&ident("x")).unwrap(), Value::Number(2.0));
        env.pop_scope();

        assert_eq!(env.get(&ident("x")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_updates_defining_scope() {
        let mut env = Environment::new();
        env.define("x", Value::Number(1.0));

        env.push_scope();
        env.push_scope();
        env.assign(&ident("x"), Value::Number(3.0)).unwrap();
        env.pop_scope();
        env.pop_scope();

        assert_eq!(env.lookup("x"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn assign_to_unknown_name_fails() {
        let mut env = Environment::new();
        let err = env.assign(&ident("y"), Value::Nil).unwrap_err();

        assert_eq!(err.runtime_kind(), Some(RuntimeErrorKind::UndefinedVariable));
        assert!(env.lookup("y").is_none());
    }

    #[test]
    fn popped_scope_is_gone() {
        let mut env = Environment::new();

        env.push_scope();
        env.define("tmp", Value::Bool(true));
        assert_eq!(env.depth(), 2);
        env.pop_scope();

        assert_eq!(env.depth(), 1);
        assert_eq!(env.current(), ROOT);
        assert!(env.get(&ident("tmp")).is_err());
    }

    #[test]
    fn root_is_never_popped() {
        let mut env = Environment::new();
        env.define("a", Value::Nil);
        env.pop_scope();

        assert_eq!(env.depth(), 1);
        assert_eq!(env.globals(), vec![("a", &Value::Nil)]);
    }
}
