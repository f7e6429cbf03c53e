//! Struct definitions, instantiation and field-path resolution.

use std::collections::{BTreeMap, HashMap};

use brewin_ast::ast::StructDecl;
use brewin_types::{default_value, Binding, StructValue, TypeTag, Value};

use crate::error::{Result, RuntimeError};

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<(String, TypeTag)>,
}

impl From<&StructDecl> for StructDef {
    fn from(decl: &StructDecl) -> Self {
        StructDef {
            name: decl.name.clone(),
            fields: decl
                .fields
                .iter()
                .map(|f| (f.name.clone(), TypeTag::from(&f.ty)))
                .collect(),
        }
    }
}

/// All struct definitions of a program. Built once before `main` runs and
/// only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct StructRegistry {
    defs: HashMap<String, StructDef>,
}

impl StructRegistry {
    /// Register every declaration. The first declaration of a name wins.
    pub fn new<'a>(decls: impl IntoIterator<Item = &'a StructDecl>) -> Self {
        let mut defs = HashMap::new();
        for decl in decls {
            defs.entry(decl.name.clone())
                .or_insert_with(|| StructDef::from(decl));
        }
        Self { defs }
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.defs.get(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// TypeError if `ty` names a struct that was never declared.
    pub fn ensure_known(&self, ty: &TypeTag) -> Result<()> {
        match ty.struct_name() {
            Some(name) if !self.defs.contains_key(name) => {
                Err(RuntimeError::type_(format!("unknown type `{name}`")))
            }
            _ => Ok(()),
        }
    }

    /// Initial binding for a new variable or field of type `ty`.
    pub fn default_binding(&self, ty: &TypeTag) -> Result<Binding> {
        self.ensure_known(ty)?;
        let value = default_value(ty).ok_or_else(|| {
            RuntimeError::type_(format!("a variable cannot have type `{ty}`"))
        })?;
        Ok(Binding::new(value, ty.clone()))
    }

    /// `new Name`: an instance whose fields all hold their type's default.
    /// Struct-typed fields start as `nil`.
    pub fn instantiate(&self, name: &str) -> Result<Value> {
        let def = self
            .get(name)
            .ok_or_else(|| RuntimeError::type_(format!("struct `{name}` used but not defined")))?;
        let mut fields = BTreeMap::new();
        for (field, ty) in &def.fields {
            fields.insert(field.clone(), self.default_binding(ty)?);
        }
        Ok(Value::Struct(StructValue {
            name: def.name.clone(),
            fields,
        }))
    }
}

/// Walk `fields` starting from `base`, one segment at a time.
pub fn resolve_path<'b>(base: &'b Binding, fields: &[String]) -> Result<&'b Binding> {
    let mut current = base;
    for field in fields {
        current = step(&current.value, field)?
            .fields
            .get(field)
            .ok_or_else(|| missing_field(field))?;
    }
    Ok(current)
}

/// Mutable counterpart of [`resolve_path`], used by assignment.
pub fn resolve_path_mut<'b>(base: &'b mut Binding, fields: &[String]) -> Result<&'b mut Binding> {
    let mut current = base;
    for field in fields {
        current = step_mut(&mut current.value, field)?
            .fields
            .get_mut(field)
            .ok_or_else(|| missing_field(field))?;
    }
    Ok(current)
}

fn step<'b>(value: &'b Value, field: &str) -> Result<&'b StructValue> {
    match value {
        Value::Struct(s) => Ok(s),
        Value::Nil => Err(nil_access(field)),
        other => Err(non_struct_access(field, other)),
    }
}

fn step_mut<'b>(value: &'b mut Value, field: &str) -> Result<&'b mut StructValue> {
    match value {
        Value::Struct(s) => Ok(s),
        Value::Nil => Err(nil_access(field)),
        other => Err(non_struct_access(field, other)),
    }
}

fn nil_access(field: &str) -> RuntimeError {
    RuntimeError::fault(format!("field access on nil: cannot read `{field}`"))
}

fn non_struct_access(field: &str, value: &Value) -> RuntimeError {
    RuntimeError::type_(format!(
        "cannot access field `{field}` of non-struct value of type {}",
        value.type_name()
    ))
}

fn missing_field(field: &str) -> RuntimeError {
    RuntimeError::name(format!("field `{field}` was not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn registry() -> StructRegistry {
        let decls = [
            StructDecl::new("Node", &[("value", "int"), ("next", "Node"), ("tag", "string")]),
            StructDecl::new("Flag", &[("on", "bool")]),
            StructDecl::new("Node", &[("other", "int")]),
        ];
        StructRegistry::new(decls.iter())
    }

    fn node_binding(reg: &StructRegistry) -> Binding {
        Binding::new(reg.instantiate("Node").unwrap(), TypeTag::Struct("Node".into()))
    }

    fn path(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_declaration_wins() {
        let reg = registry();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("Node").unwrap().fields.len(), 3);
    }

    #[test]
    fn instance_fields_default() {
        let reg = registry();
        let Value::Struct(node) = reg.instantiate("Node").unwrap() else {
            panic!("expected struct instance");
        };
        assert_eq!(node.name, "Node");
        assert_eq!(node.fields["value"].value, Value::Int(0));
        assert_eq!(node.fields["next"].value, Value::Nil);
        assert_eq!(node.fields["next"].ty, TypeTag::Struct("Node".into()));
        assert_eq!(node.fields["tag"].value, Value::Str(String::new()));
    }

    #[test]
    fn unknown_struct_is_type_error() {
        let err = registry().instantiate("Ghost").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn unknown_field_type_fails_on_instantiate() {
        let reg = StructRegistry::new([StructDecl::new("Bad", &[("x", "Missing")])].iter());
        assert_eq!(reg.instantiate("Bad").unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn void_binding_rejected() {
        let err = registry().default_binding(&TypeTag::Void).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn resolve_through_fields() {
        let reg = registry();
        let b = node_binding(&reg);
        let v = resolve_path(&b, &path(&["value"])).unwrap();
        assert_eq!(v.value, Value::Int(0));
        assert!(resolve_path(&b, &[]).is_ok());
    }

    #[test]
    fn nil_intermediate_is_fault() {
        let reg = registry();
        let mut b = node_binding(&reg);
        let err = resolve_path(&b, &path(&["next", "value"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fault);
        let err = resolve_path_mut(&mut b, &path(&["next", "value"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Fault);
    }

    #[test]
    fn non_struct_intermediate_is_type_error() {
        let reg = registry();
        let b = node_binding(&reg);
        let err = resolve_path(&b, &path(&["value", "x"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn missing_field_is_name_error() {
        let reg = registry();
        let mut b = node_binding(&reg);
        let err = resolve_path_mut(&mut b, &path(&["nope"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
    }

    #[test]
    fn mutable_walk_reaches_nested_slot() {
        let reg = registry();
        let mut b = node_binding(&reg);
        resolve_path_mut(&mut b, &path(&["next"])).unwrap().value = reg.instantiate("Node").unwrap();
        resolve_path_mut(&mut b, &path(&["next", "value"])).unwrap().value = Value::Int(9);
        let v = resolve_path(&b, &path(&["next", "value"])).unwrap();
        assert_eq!(v.value, Value::Int(9));
    }
}
