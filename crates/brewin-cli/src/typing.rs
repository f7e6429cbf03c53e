//! Applies the coercion engine at a binding boundary and reports mismatches
//! with the site that caused them.

use std::fmt;

use brewin_ast::ast::Path;
use brewin_types::{check_type, coerce, TypeTag, Value};

use crate::error::{Result, RuntimeError};
use crate::structs::StructRegistry;

/// Where a value is being bound to a declared type.
#[derive(Debug, Clone, Copy)]
pub enum Site<'a> {
    Assign(&'a Path),
    Param { func: &'a str, param: &'a str },
    Return { func: &'a str },
}

impl fmt::Display for Site<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Assign(path) => write!(f, "variable `{path}`"),
            Site::Param { func, param } => write!(f, "parameter `{param}` of `{func}`"),
            Site::Return { func } => write!(f, "return value of `{func}`"),
        }
    }
}

/// Coerce `value` to `ty` and type-check the result.
///
/// `ty` must name a known type; an undeclared struct name is a TypeError
/// even when the value is `nil`.
pub fn conform(structs: &StructRegistry, value: Value, ty: &TypeTag, site: Site<'_>) -> Result<Value> {
    structs.ensure_known(ty)?;
    let value = coerce(value, ty);
    if check_type(&value, ty) {
        Ok(value)
    } else {
        Err(RuntimeError::type_(format!(
            "{} value cannot be bound to {} of type {}",
            value.type_name(),
            site,
            ty
        )))
    }
}
