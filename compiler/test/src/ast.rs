//! Shorthands that build syntax trees the way the parser shapes them.
//!
//! ```ignore
//! let tree = program(&["io"], class("Simple", None, vec![
//!     main_method(vec![expr_stmt(call(id("io"), "println", vec![int(1)]))]),
//! ]));
//! ```

use jmmc_dsl::syntax::{NodeBuilder, NodeKind, SyntaxTree};

pub fn id(name: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Id).attr("name", name)
}

/// A `Type` node. `int[]` and `String[]` set the array flag.
pub fn ty(token: &str) -> NodeBuilder {
    match token.strip_suffix("[]") {
        Some(element) => NodeBuilder::new(NodeKind::Type)
            .attr("type", element)
            .attr("isArray", "true"),
        None => NodeBuilder::new(NodeKind::Type).attr("type", token),
    }
}

pub fn int(value: i32) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Literal)
        .attr("type", "int")
        .attr("value", value.to_string())
}

pub fn boolean(value: bool) -> NodeBuilder {
    NodeBuilder::new(NodeKind::Literal)
        .attr("type", "boolean")
        .attr("value", value.to_string())
}

pub fn this() -> NodeBuilder {
    NodeBuilder::new(NodeKind::This)
}

/// A binary operation. `op` is one of `Add Sub Mult Div Less And Or`.
pub fn bin_op(op: &str, left: NodeBuilder, right: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::BinOp)
        .attr("op", op)
        .child(left)
        .child(right)
}

pub fn not(operand: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::UnaryOp)
        .attr("op", "Not")
        .child(operand)
}

pub fn paren(inner: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::ParenthesisExpression).child(inner)
}

pub fn index(array: NodeBuilder, index: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::ArrayExpression)
        .child(array)
        .child(index)
}

pub fn new_array(size: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::NewArray).child(size)
}

pub fn new_object(class_name: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::NewObject).attr("name", class_name)
}

/// `receiver.name(args)`
pub fn call(receiver: NodeBuilder, name: &str, args: Vec<NodeBuilder>) -> NodeBuilder {
    NodeBuilder::new(NodeKind::AccessExpression)
        .child(receiver)
        .child(
            NodeBuilder::new(NodeKind::CallExpression)
                .child(id(name))
                .child(NodeBuilder::new(NodeKind::MemberArgs).children(args)),
        )
}

/// `receiver.length`
pub fn length(receiver: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::AccessExpression)
        .child(receiver)
        .child(NodeBuilder::new(NodeKind::Length))
}

pub fn var_decl(type_token: &str, name: &str) -> NodeBuilder {
    NodeBuilder::new(NodeKind::VarDeclaration)
        .child(ty(type_token))
        .child(id(name))
}

pub fn assign(name: &str, value: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::IdAssignment)
        .child(id(name))
        .child(value)
}

pub fn array_assign(name: &str, at: NodeBuilder, value: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::ArrayAssignment)
        .child(id(name))
        .child(at)
        .child(value)
}

pub fn expr_stmt(expression: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::ExpressionStatement).child(expression)
}

pub fn scope(statements: Vec<NodeBuilder>) -> NodeBuilder {
    NodeBuilder::new(NodeKind::ScopeStatement).children(statements)
}

pub fn if_else(condition: NodeBuilder, then: NodeBuilder, otherwise: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::IfStatement)
        .child(NodeBuilder::new(NodeKind::IfCondition).child(condition))
        .child(NodeBuilder::new(NodeKind::ThenStatement).child(then))
        .child(NodeBuilder::new(NodeKind::ElseStatement).child(otherwise))
}

pub fn while_loop(condition: NodeBuilder, body: NodeBuilder) -> NodeBuilder {
    NodeBuilder::new(NodeKind::WhileStatement)
        .child(NodeBuilder::new(NodeKind::WhileCondition).child(condition))
        .child(NodeBuilder::new(NodeKind::WhileBody).child(body))
}

/// `public static void main(String[] args) { body }`
pub fn main_method(body: Vec<NodeBuilder>) -> NodeBuilder {
    NodeBuilder::new(NodeKind::MainMethod)
        .child(
            NodeBuilder::new(NodeKind::MethodArguments)
                .child(ty("String[]"))
                .child(id("args")),
        )
        .child(NodeBuilder::new(NodeKind::MethodBody).children(body))
}

/// `public ret name(params) { body return result; }`
pub fn method(
    return_type: &str,
    name: &str,
    params: &[(&str, &str)],
    body: Vec<NodeBuilder>,
    result: Option<NodeBuilder>,
) -> NodeBuilder {
    let mut arguments = NodeBuilder::new(NodeKind::MethodArguments);
    for (type_token, param) in params {
        arguments = arguments.child(ty(type_token)).child(id(param));
    }
    let mut node = NodeBuilder::new(NodeKind::InstanceMethod)
        .child(
            NodeBuilder::new(NodeKind::MethodHeader)
                .child(ty(return_type))
                .child(id(name)),
        )
        .child(arguments)
        .child(NodeBuilder::new(NodeKind::MethodBody).children(body));
    if let Some(result) = result {
        node = node.child(NodeBuilder::new(NodeKind::ReturnExpression).child(result));
    }
    node
}

/// A class declaration. Members are field declarations and methods.
pub fn class(name: &str, super_name: Option<&str>, members: Vec<NodeBuilder>) -> NodeBuilder {
    let mut node = NodeBuilder::new(NodeKind::ClassDeclaration).child(id(name));
    if let Some(super_name) = super_name {
        node = node.child(NodeBuilder::new(NodeKind::InheritanceDeclaration).child(id(super_name)));
    }
    node.children(members)
}

/// A whole program. Dotted imports are split into one `ID` per segment.
pub fn program(imports: &[&str], class: NodeBuilder) -> SyntaxTree {
    let mut root = NodeBuilder::new(NodeKind::Program);
    for import in imports {
        root = root.child(
            NodeBuilder::new(NodeKind::ImportDeclaration).children(import.split('.').map(id)),
        );
    }
    root.child(class).build()
}
