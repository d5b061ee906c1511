use im::HashMap;
use log::trace;

use crate::ast::Name;
use crate::error::{self, LoxError, LoxResult};
use crate::value::Value;

/// Handle to a scope stored in an [`Environment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<ScopeId>,
}

/// Arena of lexical scopes. Scopes are created on block entry and released on
/// block exit, so their lifetimes nest like a stack; each one links back to
/// the scope it was opened in.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Number of live scopes, the global scope included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self, enclosing: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        });
        trace!("opened scope {}", self.scopes.len() - 1);
        ScopeId(self.scopes.len() - 1)
    }

    /// Releases `scope` along with any scope opened after it. The global
    /// scope is never released.
    pub fn pop(&mut self, scope: ScopeId) {
        if scope.0 > 0 {
            trace!("closed scope {}", scope.0);
            self.scopes.truncate(scope.0);
        }
    }

    pub fn define(&mut self, scope: ScopeId, name: &str, value: Value) {
        self.scopes[scope.0].values.insert(name.to_owned(), value);
    }

    pub fn get(&self, scope: ScopeId, name: &Name) -> LoxResult<Value> {
        self.resolve(scope, name)
            .map(|id| self.scopes[id.0].values[&name.name].clone())
    }

    pub fn assign(&mut self, scope: ScopeId, name: &Name, value: Value) -> LoxResult<()> {
        let id = self.resolve(scope, name)?;
        self.scopes[id.0].values.insert(name.name.clone(), value);
        Ok(())
    }

    /// Finds the innermost scope, starting from `scope`, that binds `name`.
    fn resolve(&self, scope: ScopeId, name: &Name) -> LoxResult<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if scope.values.contains_key(&name.name) {
                return Ok(id);
            }
            current = scope.enclosing;
        }

        Err(LoxError::new(error::UndefinedVariable(name.name.clone()), name.line))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
