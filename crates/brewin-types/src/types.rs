//! Declared types for variables, fields, parameters and returns.

use std::fmt;

use brewin_ast::ast::TypeExpr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int,
    Bool,
    String,
    Void,
    /// Nominal struct type. Whether the name is declared is checked by the
    /// struct registry, not here.
    Struct(String),
}

impl TypeTag {
    pub fn from_name(name: &str) -> Self {
        match name {
            "int" => TypeTag::Int,
            "bool" => TypeTag::Bool,
            "string" => TypeTag::String,
            "void" => TypeTag::Void,
            other => TypeTag::Struct(other.to_string()),
        }
    }

    pub fn struct_name(&self) -> Option<&str> {
        match self {
            TypeTag::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&TypeExpr> for TypeTag {
    fn from(ty: &TypeExpr) -> Self {
        TypeTag::from_name(ty.as_str())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Int => f.write_str("int"),
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::String => f.write_str("string"),
            TypeTag::Void => f.write_str("void"),
            TypeTag::Struct(name) => f.write_str(name),
        }
    }
}
