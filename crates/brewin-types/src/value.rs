//! Runtime values.
//!
//! Values are plain owned data. Storing a value into a variable or passing
//! it as an argument clones it, so struct instances are never shared between
//! two bindings.

use std::collections::BTreeMap;
use std::fmt;

use crate::TypeTag;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Nil,
    Struct(StructValue),
}

/// An instance of a declared struct. Every field is a typed binding.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    pub name: String,
    pub fields: BTreeMap<String, Binding>,
}

/// A value slot together with the type it was declared with.
///
/// Used for variables and struct fields alike; the declared type governs
/// every later assignment into the slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub value: Value,
    pub ty: TypeTag,
}

impl Binding {
    pub fn new(value: Value, ty: TypeTag) -> Self {
        Binding { value, ty }
    }
}

impl Value {
    /// Name of the value's runtime type, for diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Nil => "nil",
            Value::Struct(s) => &s.name,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

/// Renders a value the way `print` writes it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Str(s) => f.write_str(s),
            Value::Nil => f.write_str("nil"),
            Value::Struct(s) => {
                write!(f, "{} {{ ", s.name)?;
                for (i, (name, binding)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, binding.value)?;
                }
                write!(f, " }}")
            }
        }
    }
}
