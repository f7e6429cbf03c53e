//! Lexically scoped variable environment.
//!
//! A stack of scopes, innermost last. Lookup walks from the innermost scope
//! outwards; declaration only ever touches the innermost one. A function call
//! gets a brand new `Env` holding its parameters, so callees never see the
//! caller's locals.

use std::collections::HashMap;

use brewin_ast::ast::Path;
use brewin_types::{Binding, Value};

use crate::error::{Result, RuntimeError};
use crate::structs::{self, StructRegistry};
use crate::typing::{self, Site};

#[derive(Debug, Clone)]
pub struct Env {
    scopes: Vec<HashMap<String, Binding>>,
}

impl Default for Env {
    fn default() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }
}

impl Env {
    /// Create a new environment with a single empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment whose only scope holds the given bindings (call frames).
    pub fn with_bindings(bindings: HashMap<String, Binding>) -> Self {
        Self {
            scopes: vec![bindings],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
        tracing::trace!(depth = self.scopes.len(), "push scope");
    }

    /// Pop the innermost scope. The outermost scope is never popped; every
    /// pop must pair with an earlier push.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "unbalanced pop_scope");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
        tracing::trace!(depth = self.scopes.len(), "pop scope");
    }

    /// Run `f` inside a fresh scope that is popped on every exit path,
    /// error included.
    pub fn with_scope<T>(&mut self, f: impl FnOnce(&mut Env) -> Result<T>) -> Result<T> {
        self.push_scope();
        let result = f(self);
        self.pop_scope();
        result
    }

    /// Declare `name` in the innermost scope. Redeclaring a name already in
    /// that scope is a NameError; names in outer scopes are shadowed.
    pub fn declare(&mut self, name: &str, binding: Binding) -> Result<()> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| RuntimeError::fault("internal error: empty scope stack"))?;
        if scope.contains_key(name) {
            return Err(RuntimeError::name(format!(
                "variable `{name}` defined more than once"
            )));
        }
        scope.insert(name.to_string(), binding);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Binding> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .ok_or_else(|| RuntimeError::undefined_variable(name))
    }

    /// Read the value at a possibly dotted path. The result is a copy.
    pub fn read(&self, path: &Path) -> Result<Value> {
        let base = self.lookup(path.base())?;
        let binding = structs::resolve_path(base, path.fields())?;
        Ok(binding.value.clone())
    }

    /// Store `value` at a possibly dotted path, applying the coercion and
    /// type check of the slot's declared type.
    pub fn assign(&mut self, path: &Path, value: Value, registry: &StructRegistry) -> Result<()> {
        let base = self.lookup_mut(path.base())?;
        let slot = structs::resolve_path_mut(base, path.fields())?;
        slot.value = typing::conform(registry, value, &slot.ty, Site::Assign(path))?;
        Ok(())
    }
}
