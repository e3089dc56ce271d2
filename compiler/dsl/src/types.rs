//! The Java-- type model shared by the analyzer, the IR and the emitter.
use core::fmt;

use phf::phf_set;

static PRIMITIVE_NAMES: phf::Set<&'static str> = phf_set! {
    "int",
    "boolean",
    "void",
};

const INVALID_NAME: &str = "<Invalid>";

/// A Java-- type: a primitive or class name and whether it is an array of
/// that name. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    name: String,
    is_array: bool,
}

impl Type {
    pub fn new(name: impl Into<String>, is_array: bool) -> Self {
        Self {
            name: name.into(),
            is_array,
        }
    }

    pub fn int() -> Self {
        Self::new("int", false)
    }

    pub fn int_array() -> Self {
        Self::new("int", true)
    }

    pub fn boolean() -> Self {
        Self::new("boolean", false)
    }

    pub fn void() -> Self {
        Self::new("void", false)
    }

    pub fn string_array() -> Self {
        Self::new("String", true)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// The sentinel type of an expression that failed to type check.
    pub fn invalid() -> Self {
        Self::new(INVALID_NAME, false)
    }

    /// Parses a type token as it appears in `Type` nodes and in
    /// `inferredType` annotations: `int`, `intArray`, `int[]`, `boolean`,
    /// `String[]` or a class name.
    pub fn from_token(token: &str) -> Self {
        if token == "intArray" {
            return Self::int_array();
        }
        match token.strip_suffix("[]") {
            Some(element) => Self::new(element, true),
            None => Self::new(token, false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// The type of one element of an array type. For a non-array type this
    /// is the type itself.
    pub fn element(&self) -> Type {
        Self::new(self.name.clone(), false)
    }

    pub fn is_int(&self) -> bool {
        !self.is_array && self.name == "int"
    }

    pub fn is_boolean(&self) -> bool {
        !self.is_array && self.name == "boolean"
    }

    pub fn is_void(&self) -> bool {
        !self.is_array && self.name == "void"
    }

    pub fn is_invalid(&self) -> bool {
        self.name == INVALID_NAME
    }

    /// Returns true for `int`, `boolean` and `void`.
    pub fn is_primitive(&self) -> bool {
        !self.is_array && PRIMITIVE_NAMES.contains(self.name.as_str())
    }

    /// Returns true for class-typed values (not arrays, not primitives).
    pub fn is_object(&self) -> bool {
        !self.is_array && !self.is_invalid() && !PRIMITIVE_NAMES.contains(self.name.as_str())
    }

    /// Values of this type live in integer slots on the JVM.
    pub fn is_int_like(&self) -> bool {
        self.is_int() || self.is_boolean()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A named value: a field, a parameter or a local variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}
