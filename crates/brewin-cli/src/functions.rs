//! Function definitions and call resolution.
//!
//! Functions are overloaded by parameter count only. Built-in names are
//! resolved before user definitions and cannot be shadowed.

use std::collections::HashMap;

use brewin_ast::ast::{FnDecl, Stmt};
use brewin_types::TypeTag;

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<(String, TypeTag)>,
    pub ret_ty: TypeTag,
    pub body: Vec<Stmt>,
}

impl FunctionDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl From<&FnDecl> for FunctionDef {
    fn from(decl: &FnDecl) -> Self {
        FunctionDef {
            name: decl.name.clone(),
            params: decl
                .params
                .iter()
                .map(|p| (p.name.clone(), TypeTag::from(&p.ty)))
                .collect(),
            ret_ty: TypeTag::from(&decl.ret_ty),
            body: decl.body.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    InputI,
    InputS,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Builtin::Print),
            "inputi" => Some(Builtin::InputI),
            "inputs" => Some(Builtin::InputS),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::InputI => "inputi",
            Builtin::InputS => "inputs",
        }
    }
}

/// All user functions of a program, grouped by name in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    by_name: HashMap<String, Vec<FunctionDef>>,
}

impl FunctionRegistry {
    pub fn new<'a>(decls: impl IntoIterator<Item = &'a FnDecl>) -> Self {
        let mut by_name: HashMap<String, Vec<FunctionDef>> = HashMap::new();
        for decl in decls {
            by_name
                .entry(decl.name.clone())
                .or_default()
                .push(FunctionDef::from(decl));
        }
        Self { by_name }
    }

    /// Number of user definitions, overloads counted separately.
    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Find the overload of `name` taking `arg_count` arguments. With several
    /// candidates of the same arity the earliest declaration wins.
    pub fn resolve(&self, name: &str, arg_count: usize) -> Result<&FunctionDef> {
        let overloads = self
            .by_name
            .get(name)
            .ok_or_else(|| RuntimeError::undefined_function(name))?;
        overloads
            .iter()
            .find(|f| f.arity() == arg_count)
            .ok_or_else(|| RuntimeError::arity_mismatch(name, arg_count))
    }
}
