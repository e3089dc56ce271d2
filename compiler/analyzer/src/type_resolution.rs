//! Outcomes of typing an expression and the operator table.
use jmmc_dsl::types::Type;
use phf::phf_map;

const INHERITED_TOKEN: &str = "<Inherited>";
const IMPORT_TOKEN: &str = "<Import>";
const INVALID_TOKEN: &str = "<Invalid>";

/// The type of an expression as far as the checker can tell.
///
/// Members of the superclass and of imported classes are not visible to
/// the compiler. Expressions that depend on them have an unknown type that
/// the [`MemberPolicy`] decides how to treat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprType {
    Resolved(Type),
    /// A member that is assumed to come from the superclass.
    InheritedUnknown,
    /// A member of an imported class.
    ImportUnknown,
    /// The expression has a type error that is already reported.
    Invalid,
}

impl ExprType {
    pub fn int() -> Self {
        ExprType::Resolved(Type::int())
    }

    pub fn boolean() -> Self {
        ExprType::Resolved(Type::boolean())
    }

    /// The token stored in the `inferredType` attribute.
    pub fn token(&self) -> String {
        match self {
            ExprType::Resolved(ty) => ty.to_string(),
            ExprType::InheritedUnknown => INHERITED_TOKEN.to_string(),
            ExprType::ImportUnknown => IMPORT_TOKEN.to_string(),
            ExprType::Invalid => INVALID_TOKEN.to_string(),
        }
    }

    /// Reads back a token written by [`ExprType::token`].
    pub fn from_token(token: &str) -> Self {
        match token {
            INHERITED_TOKEN => ExprType::InheritedUnknown,
            IMPORT_TOKEN => ExprType::ImportUnknown,
            INVALID_TOKEN => ExprType::Invalid,
            other => ExprType::Resolved(Type::from_token(other)),
        }
    }

    pub fn resolved(&self) -> Option<&Type> {
        match self {
            ExprType::Resolved(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ExprType::Invalid)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ExprType::InheritedUnknown | ExprType::ImportUnknown)
    }
}

/// How the checker treats expressions of unknown type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberPolicy {
    /// Unknown types are compatible with every type.
    #[default]
    Permissive,
    /// Unknown types are only compatible with object types.
    Strict,
}

impl MemberPolicy {
    pub fn accepts_unknown(&self, expected: &Type) -> bool {
        match self {
            MemberPolicy::Permissive => true,
            MemberPolicy::Strict => expected.is_object(),
        }
    }
}

/// Binary operators as named by the `op` attribute of `BinOp` nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    Add,
    Sub,
    Mult,
    Div,
    Less,
    And,
    Or,
}

static BINARY_KINDS: phf::Map<&'static str, BinaryKind> = phf_map! {
    "Add" => BinaryKind::Add,
    "Sub" => BinaryKind::Sub,
    "Mult" => BinaryKind::Mult,
    "Div" => BinaryKind::Div,
    "Less" => BinaryKind::Less,
    "And" => BinaryKind::And,
    "Or" => BinaryKind::Or,
};

impl BinaryKind {
    pub fn from_name(name: &str) -> Option<Self> {
        BINARY_KINDS.get(name).copied()
    }

    /// Type both operands must have.
    pub fn operand_type(&self) -> Type {
        match self {
            BinaryKind::And | BinaryKind::Or => Type::boolean(),
            _ => Type::int(),
        }
    }

    pub fn result_type(&self) -> Type {
        match self {
            BinaryKind::Less | BinaryKind::And | BinaryKind::Or => Type::boolean(),
            _ => Type::int(),
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryKind::And | BinaryKind::Or)
    }
}
