//! Three-address intermediate representation of one Java-- class.
//!
//! Every value that an instruction consumes is an [`Element`]: a literal, a
//! named variable (local, parameter, temporary, `this` or a class reference)
//! or an element of an int array. Nested expressions are flattened into
//! temporaries before they reach this representation.
//!
//! A [`Program`] renders as OLLIR-style text through `Display`, which is
//! useful when debugging the lowering.

use core::fmt;
use std::fmt::Write;

use indexmap::IndexMap;

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessModifier {
    Public,
    Private,
    Protected,
    Default,
}

impl AccessModifier {
    /// Keyword for the modifier. Default access has no keyword.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            AccessModifier::Public => Some("public"),
            AccessModifier::Private => Some("private"),
            AccessModifier::Protected => Some("protected"),
            AccessModifier::Default => None,
        }
    }
}

/// A named, typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The implicit receiver of an instance method.
    pub fn this(class_name: &str) -> Self {
        Self::new("this", Type::class(class_name))
    }

    pub fn is_this(&self) -> bool {
        self.name == "this"
    }
}

/// An operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A constant. Booleans are `0` and `1`.
    Literal { value: i32, ty: Type },
    Variable(Variable),
    /// `array[index]`, where the type is the type of the element.
    ArrayElement {
        array: Variable,
        index: Box<Element>,
        ty: Type,
    },
}

impl Element {
    pub fn int(value: i32) -> Self {
        Element::Literal {
            value,
            ty: Type::int(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Element::Literal {
            value: i32::from(value),
            ty: Type::boolean(),
        }
    }

    pub fn variable(name: impl Into<String>, ty: Type) -> Self {
        Element::Variable(Variable::new(name, ty))
    }

    pub fn ty(&self) -> &Type {
        match self {
            Element::Literal { ty, .. } => ty,
            Element::Variable(variable) => &variable.ty,
            Element::ArrayElement { ty, .. } => ty,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Element::Variable(variable) => Some(variable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Lth,
    Gte,
    Eq,
    Neq,
}

impl BinaryOperator {
    /// Type of the value the operator produces.
    pub fn result_type(&self) -> Type {
        match self {
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div => {
                Type::int()
            }
            _ => Type::boolean(),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Lth => "<",
            BinaryOperator::Gte => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::Neq => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
}

/// How a call is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Virtual,
    /// Constructors and `super` calls.
    Special,
    Static,
    /// Allocation of an object (target is the class) or of an int array
    /// (the only argument is the size).
    New,
    ArrayLength,
    LoadConst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub target: Element,
    pub method: Option<String>,
    pub args: Vec<Element>,
    /// Parameter types of the method the call selects, when the class
    /// declares it. Otherwise the invocation is described by the argument
    /// types.
    pub param_types: Option<Vec<Type>>,
    pub return_type: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Assign {
        dest: Element,
        rhs: Box<Instruction>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Element,
        right: Element,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Element,
    },
    Call(Call),
    GetField {
        object: Element,
        field: Variable,
    },
    PutField {
        object: Element,
        field: Variable,
        value: Element,
    },
    Goto {
        label: String,
    },
    /// Jumps to the label when the condition is true. An element condition
    /// is carried as `NoOp`.
    CondBranch {
        condition: Box<Instruction>,
        label: String,
    },
    Return {
        value: Option<Element>,
    },
    NoOp {
        operand: Element,
    },
}

impl Instruction {
    /// Type of the value the instruction leaves behind. Instructions that
    /// only have an effect are `void`.
    pub fn result_type(&self) -> Type {
        match self {
            Instruction::BinaryOp { op, .. } => op.result_type(),
            Instruction::UnaryOp { .. } => Type::boolean(),
            Instruction::Call(call) => call.return_type.clone(),
            Instruction::GetField { field, .. } => field.ty.clone(),
            Instruction::NoOp { operand } => operand.ty().clone(),
            Instruction::Assign { .. }
            | Instruction::PutField { .. }
            | Instruction::Goto { .. }
            | Instruction::CondBranch { .. }
            | Instruction::Return { .. } => Type::void(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub access: AccessModifier,
    pub is_static: bool,
    pub is_final: bool,
    pub initial_value: Option<i32>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            access: AccessModifier::Default,
            is_static: false,
            is_final: false,
            initial_value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub access: AccessModifier,
    pub is_static: bool,
    pub is_constructor: bool,
    pub params: Vec<Variable>,
    pub return_type: Type,
    pub instructions: Vec<Instruction>,
    /// Label name to the index of the instruction it marks. The index may
    /// be one past the last instruction.
    pub labels: IndexMap<String, usize>,
}

impl Method {
    pub fn new(name: impl Into<String>, params: Vec<Variable>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            access: AccessModifier::Public,
            is_static: false,
            is_constructor: false,
            params,
            return_type,
            instructions: vec![],
            labels: IndexMap::new(),
        }
    }

    /// The default constructor, which only calls the superclass constructor.
    pub fn constructor(class_name: &str) -> Self {
        let mut method = Self::new("<init>", vec![], Type::void());
        method.is_constructor = true;
        method.instructions.push(Instruction::Call(Call {
            kind: CallKind::Special,
            target: Element::Variable(Variable::this(class_name)),
            method: Some("<init>".to_string()),
            args: vec![],
            param_types: None,
            return_type: Type::void(),
        }));
        method
    }

    /// Labels that mark the instruction at `index`, in insertion order.
    pub fn labels_at(&self, index: usize) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, at)| **at == index)
            .map(|(label, _)| label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub imports: Vec<String>,
    pub class_name: String,
    pub super_name: Option<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl Program {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// Renders the program as OLLIR-style text, indenting each nesting level
    /// by `indent` spaces.
    pub fn render(&self, indent: usize) -> String {
        let pad = |level: usize| " ".repeat(indent * level);
        let mut out = String::new();

        for import in &self.imports {
            let _ = writeln!(out, "import {};", import);
        }
        if !self.imports.is_empty() {
            out.push('\n');
        }

        match &self.super_name {
            Some(super_name) => {
                let _ = writeln!(out, "{} extends {} {{", self.class_name, super_name);
            }
            None => {
                let _ = writeln!(out, "{} {{", self.class_name);
            }
        }

        for field in &self.fields {
            let mut line = String::from(".field ");
            if let Some(keyword) = field.access.keyword() {
                line.push_str(keyword);
                line.push(' ');
            }
            if field.is_static {
                line.push_str("static ");
            }
            if field.is_final {
                line.push_str("final ");
            }
            let _ = write!(line, "{}.{}", field.name, suffix(&field.ty));
            if let Some(value) = field.initial_value {
                let _ = write!(line, " = {}", value);
            }
            let _ = writeln!(out, "{}{};", pad(1), line);
        }

        for method in &self.methods {
            out.push('\n');
            let params = method
                .params
                .iter()
                .map(|param| format!("{}.{}", param.name, suffix(&param.ty)))
                .collect::<Vec<_>>()
                .join(", ");
            if method.is_constructor {
                let _ = writeln!(
                    out,
                    "{}.construct {}({}).V {{",
                    pad(1),
                    self.class_name,
                    params
                );
            } else {
                let mut header = String::from(".method ");
                if let Some(keyword) = method.access.keyword() {
                    header.push_str(keyword);
                    header.push(' ');
                }
                if method.is_static {
                    header.push_str("static ");
                }
                let _ = writeln!(
                    out,
                    "{}{}{}({}).{} {{",
                    pad(1),
                    header,
                    method.name,
                    params,
                    suffix(&method.return_type)
                );
            }
            for (index, instruction) in method.instructions.iter().enumerate() {
                for label in method.labels_at(index) {
                    let _ = writeln!(out, "{}{}:", pad(1), label);
                }
                let _ = writeln!(out, "{}{};", pad(2), InstructionText(instruction));
            }
            for label in method.labels_at(method.instructions.len()) {
                let _ = writeln!(out, "{}{}:", pad(1), label);
            }
            let _ = writeln!(out, "{}}}", pad(1));
        }

        out.push_str("}\n");
        out
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(4))
    }
}

/// OLLIR type suffix.
fn suffix(ty: &Type) -> String {
    let element = match ty.name() {
        "int" => "i32",
        "boolean" => "bool",
        "void" => "V",
        other => other,
    };
    if ty.is_array() {
        format!("array.{}", element)
    } else {
        element.to_string()
    }
}

struct ElementText<'a>(&'a Element);

impl fmt::Display for ElementText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Element::Literal { value, ty } => write!(f, "{}.{}", value, suffix(ty)),
            Element::Variable(variable) => {
                // `this` and static class references carry no suffix
                if variable.is_this() || variable.name == variable.ty.name() {
                    write!(f, "{}", variable.name)
                } else {
                    write!(f, "{}.{}", variable.name, suffix(&variable.ty))
                }
            }
            Element::ArrayElement { array, index, ty } => {
                write!(f, "{}[{}].{}", array.name, ElementText(index), suffix(ty))
            }
        }
    }
}

struct InstructionText<'a>(&'a Instruction);

impl fmt::Display for InstructionText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Instruction::Assign { dest, rhs } => write!(
                f,
                "{} :=.{} {}",
                ElementText(dest),
                suffix(dest.ty()),
                InstructionText(rhs)
            ),
            Instruction::BinaryOp { op, left, right } => write!(
                f,
                "{} {}.{} {}",
                ElementText(left),
                op.symbol(),
                suffix(&op.result_type()),
                ElementText(right)
            ),
            Instruction::UnaryOp { operand, .. } => {
                write!(f, "!.bool {}", ElementText(operand))
            }
            Instruction::Call(call) => {
                let name = match call.kind {
                    CallKind::Virtual => "invokevirtual",
                    CallKind::Special => "invokespecial",
                    CallKind::Static => "invokestatic",
                    CallKind::New => "new",
                    CallKind::ArrayLength => "arraylength",
                    CallKind::LoadConst => "ldc",
                };
                write!(f, "{}({}", name, ElementText(&call.target))?;
                if let Some(method) = &call.method {
                    write!(f, ", \"{}\"", method)?;
                }
                for arg in &call.args {
                    write!(f, ", {}", ElementText(arg))?;
                }
                write!(f, ").{}", suffix(&call.return_type))
            }
            Instruction::GetField { object, field } => write!(
                f,
                "getfield({}, {}.{}).{}",
                ElementText(object),
                field.name,
                suffix(&field.ty),
                suffix(&field.ty)
            ),
            Instruction::PutField {
                object,
                field,
                value,
            } => write!(
                f,
                "putfield({}, {}.{}, {}).V",
                ElementText(object),
                field.name,
                suffix(&field.ty),
                ElementText(value)
            ),
            Instruction::Goto { label } => write!(f, "goto {}", label),
            Instruction::CondBranch { condition, label } => {
                write!(f, "if ({}) goto {}", InstructionText(condition), label)
            }
            Instruction::Return { value: Some(value) } => {
                write!(f, "ret.{} {}", suffix(value.ty()), ElementText(value))
            }
            Instruction::Return { value: None } => write!(f, "ret.V"),
            Instruction::NoOp { operand } => write!(f, "{}", ElementText(operand)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_program() -> Program {
        let mut main = Method::new(
            "main",
            vec![Variable::new("args", Type::string_array())],
            Type::void(),
        );
        main.is_static = true;
        let x = Element::variable("x", Type::int());
        main.instructions.push(Instruction::Assign {
            dest: x.clone(),
            rhs: Box::new(Instruction::BinaryOp {
                op: BinaryOperator::Add,
                left: x,
                right: Element::int(1),
            }),
        });
        main.labels.insert("After1".to_string(), 1);
        main.instructions.push(Instruction::Return { value: None });

        let mut field = Field::new("count", Type::int());
        field.access = AccessModifier::Private;

        Program {
            imports: vec!["io".to_string()],
            class_name: "Simple".to_string(),
            super_name: None,
            fields: vec![field],
            methods: vec![Method::constructor("Simple"), main],
        }
    }

    #[test]
    fn render_when_program_then_ollir_text() {
        let text = simple_program().to_string();
        let expected = "import io;

Simple {
    .field private count.i32;

    .construct Simple().V {
        invokespecial(this, \"<init>\").V;
    }

    .method public static main(args.array.String).V {
        x.i32 :=.i32 x.i32 +.i32 1.i32;
    After1:
        ret.V;
    }
}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn render_when_indent_two_then_uses_two_spaces() {
        let text = simple_program().render(2);
        assert!(text.contains("\n  .field private count.i32;\n"));
        assert!(text.contains("\n    ret.V;\n"));
    }

    #[test]
    fn labels_at_when_two_labels_then_both_in_order() {
        let mut method = Method::new("foo", vec![], Type::void());
        method.labels.insert("Loop0".to_string(), 0);
        method.labels.insert("Body1".to_string(), 1);
        method.labels.insert("End2".to_string(), 0);
        assert_eq!(method.labels_at(0).collect::<Vec<_>>(), vec!["Loop0", "End2"]);
    }

    #[test]
    fn result_type_when_relational_then_boolean() {
        let instruction = Instruction::BinaryOp {
            op: BinaryOperator::Lth,
            left: Element::int(1),
            right: Element::int(2),
        };
        assert_eq!(instruction.result_type(), Type::boolean());
    }
}
