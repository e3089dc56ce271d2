//! The class table: everything the later stages need to know about the
//! declarations of the single class in a compilation unit.
//!
//! The table is filled by the symbol table builder and read-only afterward.
//! Maps keep insertion order so that every stage walks declarations in
//! source order.
use core::fmt;

use indexmap::IndexMap;
use jmmc_dsl::types::{Symbol, Type};

/// The key of the method table: name, return type and parameter types.
/// Parameter names do not take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: String,
    pub return_type: Type,
    pub parameter_types: Vec<Type>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .parameter_types
            .iter()
            .map(Type::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} {}({})", self.return_type, self.name, params)
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    name: String,
    return_type: Type,
    parameters: Vec<Symbol>,
    locals: IndexMap<String, Symbol>,
    is_static: bool,
}

impl Method {
    pub fn new(
        name: impl Into<String>,
        return_type: Type,
        parameters: Vec<Symbol>,
        is_static: bool,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters,
            locals: IndexMap::new(),
            is_static,
        }
    }

    pub fn signature(&self) -> Signature {
        Signature {
            name: self.name.clone(),
            return_type: self.return_type.clone(),
            parameter_types: self.parameters.iter().map(|p| p.ty.clone()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn parameters(&self) -> &[Symbol] {
        &self.parameters
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Local variables in declaration order.
    pub fn locals(&self) -> impl Iterator<Item = &Symbol> {
        self.locals.values()
    }

    pub fn local(&self, name: &str) -> Option<&Symbol> {
        self.locals.get(name)
    }

    /// The position and symbol of the named parameter.
    pub fn parameter(&self, name: &str) -> Option<(usize, &Symbol)> {
        self.parameters
            .iter()
            .enumerate()
            .find(|(_, param)| param.name == name)
    }

    /// Adds a local variable. Fails with the existing symbol if the name is
    /// already declared in the method.
    pub fn add_local(&mut self, symbol: Symbol) -> Result<(), &Symbol> {
        if self.locals.contains_key(&symbol.name) {
            return Err(&self.locals[&symbol.name]);
        }
        self.locals.insert(symbol.name.clone(), symbol);
        Ok(())
    }
}

/// Methods are equal when their signatures are equal.
impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for Method {}

/// What a name inside a method body refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Local(Symbol),
    /// Parameter and its position in the parameter list.
    Parameter(usize, Symbol),
    Field(Symbol),
    /// An imported class used by its simple name.
    Import(String),
}

impl Binding {
    pub fn ty(&self) -> Type {
        match self {
            Binding::Local(symbol) | Binding::Parameter(_, symbol) | Binding::Field(symbol) => {
                symbol.ty.clone()
            }
            Binding::Import(name) => Type::class(name.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    imports: Vec<String>,
    class_name: Option<String>,
    super_name: Option<String>,
    fields: IndexMap<String, Symbol>,
    methods: IndexMap<Signature, Method>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dotted import paths in declaration order.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Adds an import. Returns false if the import is already present.
    pub fn add_import(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.imports.contains(&path) {
            return false;
        }
        self.imports.push(path);
        true
    }

    /// Returns true when `name` is an import path or the last segment of one.
    pub fn is_import(&self, name: &str) -> bool {
        self.import_path(name).is_some()
    }

    /// The full dotted path of the import known by `name`.
    pub fn import_path(&self, name: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|import| *import == name || import.rsplit('.').next() == Some(name))
            .map(String::as_str)
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, name: impl Into<String>) {
        self.class_name = Some(name.into());
    }

    pub fn super_name(&self) -> Option<&str> {
        self.super_name.as_deref()
    }

    pub fn set_super_name(&mut self, name: impl Into<String>) {
        self.super_name = Some(name.into());
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Symbol> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.get(name)
    }

    /// Adds a field. Fails with the existing field if the name is taken.
    pub fn add_field(&mut self, symbol: Symbol) -> Result<(), &Symbol> {
        if self.fields.contains_key(&symbol.name) {
            return Err(&self.fields[&symbol.name]);
        }
        self.fields.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values()
    }

    pub fn method(&self, signature: &Signature) -> Option<&Method> {
        self.methods.get(signature)
    }

    pub fn method_mut(&mut self, signature: &Signature) -> Option<&mut Method> {
        self.methods.get_mut(signature)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Method> + 'a {
        self.methods.values().filter(move |method| method.name == name)
    }

    /// Adds a method. Fails with the existing method if the signature is
    /// taken; the existing method is kept.
    pub fn add_method(&mut self, method: Method) -> Result<(), &Method> {
        let signature = method.signature();
        if self.methods.contains_key(&signature) {
            return Err(&self.methods[&signature]);
        }
        self.methods.insert(signature, method);
        Ok(())
    }

    /// Returns true when a variable may be declared with the type: `int`,
    /// `int[]`, `boolean`, the class itself or an imported class.
    pub fn is_known_type(&self, ty: &Type) -> bool {
        if ty.is_array() {
            return ty.name() == "int";
        }
        ty.is_int()
            || ty.is_boolean()
            || Some(ty.name()) == self.class_name()
            || self.is_import(ty.name())
    }

    /// Resolves a name used inside the method: local variables first, then
    /// parameters, fields and finally imports.
    pub fn resolve(&self, method: &Method, name: &str) -> Option<Binding> {
        if let Some(local) = method.local(name) {
            return Some(Binding::Local(local.clone()));
        }
        if let Some((index, param)) = method.parameter(name) {
            return Some(Binding::Parameter(index, param.clone()));
        }
        if let Some(field) = self.field(name) {
            return Some(Binding::Field(field.clone()));
        }
        if self.is_import(name) {
            return Some(Binding::Import(name.to_string()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, params: &[(&str, Type)]) -> Method {
        Method::new(
            name,
            Type::int(),
            params
                .iter()
                .map(|(name, ty)| Symbol::new(*name, ty.clone()))
                .collect(),
            false,
        )
    }

    #[test]
    fn eq_when_parameter_names_differ_then_equal() {
        let a = method("foo", &[("a", Type::int())]);
        let b = method("foo", &[("b", Type::int())]);
        assert_eq!(a, b);
    }

    #[test]
    fn eq_when_parameter_types_differ_then_not_equal() {
        let a = method("foo", &[("a", Type::int())]);
        let b = method("foo", &[("a", Type::boolean())]);
        assert_ne!(a, b);
    }

    #[test]
    fn add_method_when_same_signature_then_keeps_first() {
        let mut table = ClassTable::new();
        let mut first = method("foo", &[("a", Type::int())]);
        first.add_local(Symbol::new("x", Type::int())).unwrap();
        table.add_method(first).unwrap();

        let result = table.add_method(method("foo", &[("b", Type::int())]));

        assert!(result.is_err());
        let signature = method("foo", &[("c", Type::int())]).signature();
        assert!(table.method(&signature).unwrap().local("x").is_some());
        assert_eq!(table.methods().count(), 1);
    }

    #[test]
    fn add_local_when_duplicate_then_returns_existing() {
        let mut m = method("foo", &[]);
        m.add_local(Symbol::new("x", Type::int())).unwrap();
        let existing = m.add_local(Symbol::new("x", Type::boolean())).unwrap_err();
        assert_eq!(existing.ty, Type::int());
    }

    #[test]
    fn is_import_when_last_segment_then_true() {
        let mut table = ClassTable::new();
        table.add_import("java.util.List");
        assert!(table.is_import("List"));
        assert!(table.is_import("java.util.List"));
        assert!(!table.is_import("util"));
        assert_eq!(table.import_path("List"), Some("java.util.List"));
    }

    #[test]
    fn resolve_when_local_shadows_field_then_local() {
        let mut table = ClassTable::new();
        table.add_field(Symbol::new("x", Type::boolean())).unwrap();
        let mut m = method("foo", &[("y", Type::int())]);
        m.add_local(Symbol::new("x", Type::int())).unwrap();

        assert_eq!(
            table.resolve(&m, "x"),
            Some(Binding::Local(Symbol::new("x", Type::int())))
        );
        assert_eq!(
            table.resolve(&m, "y"),
            Some(Binding::Parameter(0, Symbol::new("y", Type::int())))
        );
        assert_eq!(table.resolve(&m, "z"), None);
    }

    #[test]
    fn is_known_type_when_boolean_array_then_false() {
        let mut table = ClassTable::new();
        table.set_class_name("Simple");
        assert!(table.is_known_type(&Type::int_array()));
        assert!(table.is_known_type(&Type::class("Simple")));
        assert!(!table.is_known_type(&Type::new("boolean", true)));
        assert!(!table.is_known_type(&Type::class("Other")));
    }
}
