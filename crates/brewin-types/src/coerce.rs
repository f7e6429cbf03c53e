//! Coercion and type-check rules applied at every value-producing boundary
//! (assignment, parameter binding, function return).
//!
//! There is exactly one implicit conversion: `int` to `bool`.

use crate::{TypeTag, Value};

/// Applies the implicit conversion for `target`, if any.
///
/// Only an `Int` headed for `bool` changes: zero becomes `false`, anything
/// else `true`. All other values pass through untouched.
pub fn coerce(value: Value, target: &TypeTag) -> Value {
    match (value, target) {
        (Value::Int(i), TypeTag::Bool) => Value::Bool(i != 0),
        (v, _) => v,
    }
}

/// Whether `value` may be stored in a slot declared as `target`.
///
/// `bool` also accepts `int` since it is coercible. Struct types are nominal:
/// a slot of type `Point` takes `nil` or a `Point` instance, nothing else.
pub fn check_type(value: &Value, target: &TypeTag) -> bool {
    match (target, value) {
        (TypeTag::Int, Value::Int(_)) => true,
        (TypeTag::Bool, Value::Bool(_) | Value::Int(_)) => true,
        (TypeTag::String, Value::Str(_)) => true,
        (TypeTag::Void, Value::Nil) => true,
        (TypeTag::Struct(_), Value::Nil) => true,
        (TypeTag::Struct(expected), Value::Struct(s)) => s.name == *expected,
        _ => false,
    }
}

/// Initial value of a freshly declared slot. `None` for `void`, which no
/// variable or field may have.
///
/// Struct-typed slots start as `nil`; nested structs are never built eagerly.
pub fn default_value(target: &TypeTag) -> Option<Value> {
    match target {
        TypeTag::Int => Some(Value::Int(0)),
        TypeTag::Bool => Some(Value::Bool(false)),
        TypeTag::String => Some(Value::Str(String::new())),
        TypeTag::Struct(_) => Some(Value::Nil),
        TypeTag::Void => None,
    }
}
