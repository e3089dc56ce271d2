//! Type checks the method bodies of the class.
//!
//! The checker walks every method with a [`MethodContext`] that holds the
//! method's symbols and the names of the locals assigned so far. Every
//! expression node receives an `inferredType` attribute. An expression with
//! a type error has the `Invalid` type; parents do not report errors for
//! `Invalid` operands, so one mistake produces one diagnostic.
use std::collections::HashSet;

use jmmc_dsl::{
    diagnostic::{Diagnostic, Label},
    syntax::{NodeId, NodeKind, SyntaxTree, INFERRED_TYPE},
    types::Type,
};
use jmmc_problems::Problem;
use log::{debug, trace};

use crate::{
    symbol_table::{Binding, ClassTable, Method},
    symbol_table_builder::{declared_symbol, method_from_node},
    type_resolution::{BinaryKind, ExprType, MemberPolicy},
};

/// Checks the tree against the class table and returns the diagnostics.
pub fn check(tree: &mut SyntaxTree, table: &ClassTable, policy: MemberPolicy) -> Vec<Diagnostic> {
    let mut checker = TypeChecker {
        table,
        policy,
        diagnostics: vec![],
    };
    if let Some(root) = tree.root() {
        checker.visit_program(tree, root);
    }
    debug!("Type check found {} diagnostics", checker.diagnostics.len());
    checker.diagnostics
}

/// State of the walk through one method.
struct MethodContext {
    method: Method,
    /// Locals that have been assigned a value so far.
    assigned: HashSet<String>,
}

impl MethodContext {
    fn new(method: Method) -> Self {
        Self {
            method,
            assigned: HashSet::new(),
        }
    }

    fn is_static(&self) -> bool {
        self.method.is_static()
    }
}

struct TypeChecker<'a> {
    table: &'a ClassTable,
    policy: MemberPolicy,
    diagnostics: Vec<Diagnostic>,
}

fn label(tree: &SyntaxTree, id: NodeId, message: &str) -> Label {
    Label::at(tree.position(id), message)
}

impl TypeChecker<'_> {
    fn visit_program(&mut self, tree: &mut SyntaxTree, id: NodeId) {
        let classes: Vec<NodeId> = tree
            .children_of_kind(id, NodeKind::ClassDeclaration)
            .collect();
        for class in classes {
            for member in tree.children(class).to_vec() {
                match tree.kind(member) {
                    NodeKind::VarDeclaration => self.check_declaration(tree, member),
                    NodeKind::MainMethod | NodeKind::InstanceMethod => {
                        self.check_method(tree, member)
                    }
                    _ => {}
                }
            }
        }
    }

    fn check_declaration(&mut self, tree: &SyntaxTree, id: NodeId) {
        let Some(symbol) = declared_symbol(tree, id) else {
            return;
        };
        if !self.table.is_known_type(&symbol.ty) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::UndefinedType, label(tree, id, "Variable declaration"))
                    .with_context("variable", &symbol.name)
                    .with_context("type", &symbol.ty.to_string()),
            );
        }
    }

    /// Parameter and return types of instance methods follow the rule of
    /// variable declarations; `String[]` is also accepted for parameters.
    fn check_signature_types(&mut self, tree: &SyntaxTree, id: NodeId) {
        let header = tree.first_child_of_kind(id, NodeKind::MethodHeader);
        let arguments = tree.first_child_of_kind(id, NodeKind::MethodArguments);
        let type_nodes = header
            .into_iter()
            .chain(arguments)
            .flat_map(|parent| tree.children_of_kind(parent, NodeKind::Type))
            .collect::<Vec<_>>();
        for type_node in type_nodes {
            let Some(ty) = tree.declared_type(type_node) else {
                continue;
            };
            let is_parameter = tree.parent(type_node) == arguments;
            if self.table.is_known_type(&ty) || (is_parameter && ty == Type::string_array()) {
                continue;
            }
            self.diagnostics.push(
                Diagnostic::problem(Problem::UndefinedType, label(tree, type_node, "Method signature"))
                    .with_context("type", &ty.to_string()),
            );
        }
    }

    fn check_method(&mut self, tree: &mut SyntaxTree, id: NodeId) {
        let Some(declared) = method_from_node(tree, id) else {
            return;
        };
        let method = self
            .table
            .method(&declared.signature())
            .cloned()
            .unwrap_or(declared);
        trace!("Checking method {}", method.signature());

        if tree.kind(id) == NodeKind::InstanceMethod {
            self.check_signature_types(tree, id);
        }

        let mut ctx = MethodContext::new(method);
        for child in tree.children(id).to_vec() {
            match tree.kind(child) {
                NodeKind::MethodBody => self.visit_body(tree, &mut ctx, child),
                NodeKind::ReturnExpression => self.check_return(tree, &mut ctx, child),
                _ => {}
            }
        }
    }

    fn visit_body(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) {
        ctx.assigned.clear();
        for child in tree.children(id).to_vec() {
            self.visit_statement(tree, ctx, child);
        }
    }

    fn check_return(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) {
        let Some(expression) = tree.child(id, 0) else {
            return;
        };
        let actual = self.visit_expression(tree, ctx, expression);
        let expected = ctx.method.return_type().clone();
        if !self.accepts(&expected, &actual) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::ReturnTypeMismatch, label(tree, id, "Return value"))
                    .with_context("method", ctx.method.name())
                    .with_context("expected", &expected.to_string())
                    .with_context("found", &actual.token()),
            );
        }
    }

    fn visit_statement(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) {
        match tree.kind(id) {
            NodeKind::VarDeclaration => self.check_declaration(tree, id),
            NodeKind::ExpressionStatement => {
                if let Some(expression) = tree.child(id, 0) {
                    self.visit_expression(tree, ctx, expression);
                }
            }
            NodeKind::ScopeStatement
            | NodeKind::ThenStatement
            | NodeKind::ElseStatement
            | NodeKind::WhileBody
            | NodeKind::IfStatement
            | NodeKind::WhileStatement => {
                for child in tree.children(id).to_vec() {
                    self.visit_statement(tree, ctx, child);
                }
            }
            NodeKind::IfCondition | NodeKind::WhileCondition => self.check_condition(tree, ctx, id),
            NodeKind::IdAssignment => self.check_assignment(tree, ctx, id),
            NodeKind::ArrayAssignment => self.check_array_assignment(tree, ctx, id),
            NodeKind::BinOp
            | NodeKind::UnaryOp
            | NodeKind::ArrayExpression
            | NodeKind::AccessExpression
            | NodeKind::ParenthesisExpression
            | NodeKind::Literal
            | NodeKind::This
            | NodeKind::NewArray
            | NodeKind::NewObject
            | NodeKind::Id => {
                self.visit_expression(tree, ctx, id);
            }
            NodeKind::Program
            | NodeKind::ImportDeclaration
            | NodeKind::ClassDeclaration
            | NodeKind::InheritanceDeclaration
            | NodeKind::Type
            | NodeKind::MainMethod
            | NodeKind::InstanceMethod
            | NodeKind::MethodHeader
            | NodeKind::MethodArguments
            | NodeKind::MethodBody
            | NodeKind::ReturnExpression
            | NodeKind::CallExpression
            | NodeKind::MemberArgs
            | NodeKind::Length => {
                self.diagnostics.push(
                    Diagnostic::todo(file!(), line!())
                        .with_context("kind", &format!("{:?}", tree.kind(id))),
                );
            }
        }
    }

    fn check_condition(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) {
        let Some(expression) = tree.child(id, 0) else {
            return;
        };
        let actual = self.visit_expression(tree, ctx, expression);
        if !self.accepts(&Type::boolean(), &actual) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::ConditionNotBoolean, label(tree, expression, "Condition"))
                    .with_context("found", &actual.token()),
            );
        }
    }

    /// Resolves the target of an assignment. Reports undeclared names and
    /// fields used from the static method.
    fn assignment_target(
        &mut self,
        tree: &SyntaxTree,
        ctx: &MethodContext,
        target: NodeId,
    ) -> Option<(String, Binding)> {
        let name = tree.identifier(target)?.to_string();
        match self.table.resolve(&ctx.method, &name) {
            None | Some(Binding::Import(_)) => {
                self.diagnostics.push(
                    Diagnostic::problem(Problem::VariableNotDeclared, label(tree, target, "Assignment"))
                        .with_context("variable", &name),
                );
                None
            }
            Some(Binding::Field(_)) if ctx.is_static() => {
                self.diagnostics.push(
                    Diagnostic::problem(Problem::FieldInStaticMethod, label(tree, target, "Assignment"))
                        .with_context("field", &name),
                );
                None
            }
            Some(binding) => Some((name, binding)),
        }
    }

    fn check_assignment(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) {
        let (Some(target), Some(value)) = (tree.child(id, 0), tree.child(id, 1)) else {
            return;
        };
        let actual = self.visit_expression(tree, ctx, value);
        let Some((name, binding)) = self.assignment_target(tree, ctx, target) else {
            return;
        };

        let expected = binding.ty();
        if !self.accepts(&expected, &actual) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::AssignmentTypeMismatch, label(tree, id, "Assignment"))
                    .with_context("variable", &name)
                    .with_context("expected", &expected.to_string())
                    .with_context("found", &actual.token()),
            );
        }
        ctx.assigned.insert(name);
    }

    fn check_array_assignment(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) {
        let (Some(target), Some(index), Some(value)) =
            (tree.child(id, 0), tree.child(id, 1), tree.child(id, 2))
        else {
            return;
        };
        let index_type = self.visit_expression(tree, ctx, index);
        let value_type = self.visit_expression(tree, ctx, value);
        let Some((name, binding)) = self.assignment_target(tree, ctx, target) else {
            return;
        };

        if matches!(binding, Binding::Local(_)) && !ctx.assigned.contains(&name) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::VariableNotInitialized, label(tree, target, "Array"))
                    .with_context("variable", &name),
            );
            return;
        }

        let array_type = binding.ty();
        if !array_type.is_array() {
            self.diagnostics.push(
                Diagnostic::problem(Problem::IndexedNotArray, label(tree, target, "Array"))
                    .with_context("variable", &name)
                    .with_context("type", &array_type.to_string()),
            );
            return;
        }
        if !self.accepts(&Type::int(), &index_type) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::ArrayIndexNotInt, label(tree, index, "Index"))
                    .with_context("found", &index_type.token()),
            );
            return;
        }
        let element = array_type.element();
        if !self.accepts(&element, &value_type) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::ArrayAssignmentTypeMismatch, label(tree, id, "Assignment"))
                    .with_context("variable", &name)
                    .with_context("expected", &element.to_string())
                    .with_context("found", &value_type.token()),
            );
        }
    }

    /// Types the expression and records the type on the node.
    fn visit_expression(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) -> ExprType {
        let ty = self.infer(tree, ctx, id);
        tree.annotate(id, INFERRED_TYPE, ty.token());
        ty
    }

    fn infer(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) -> ExprType {
        match tree.kind(id) {
            NodeKind::Literal => match tree.attribute(id, "type") {
                Some("boolean") => ExprType::boolean(),
                _ => ExprType::int(),
            },
            NodeKind::This => self.check_this(tree, ctx, id),
            NodeKind::Id => self.check_identifier(tree, ctx, id),
            NodeKind::ParenthesisExpression => match tree.child(id, 0) {
                Some(inner) => self.visit_expression(tree, ctx, inner),
                None => ExprType::Invalid,
            },
            NodeKind::BinOp => self.check_binary(tree, ctx, id),
            NodeKind::UnaryOp => self.check_not(tree, ctx, id),
            NodeKind::ArrayExpression => self.check_index(tree, ctx, id),
            NodeKind::NewArray => self.check_new_array(tree, ctx, id),
            NodeKind::NewObject => self.check_new_object(tree, id),
            NodeKind::AccessExpression => self.check_access(tree, ctx, id),
            NodeKind::Program
            | NodeKind::ImportDeclaration
            | NodeKind::ClassDeclaration
            | NodeKind::InheritanceDeclaration
            | NodeKind::VarDeclaration
            | NodeKind::Type
            | NodeKind::MainMethod
            | NodeKind::InstanceMethod
            | NodeKind::MethodHeader
            | NodeKind::MethodArguments
            | NodeKind::MethodBody
            | NodeKind::ReturnExpression
            | NodeKind::ExpressionStatement
            | NodeKind::ScopeStatement
            | NodeKind::IfStatement
            | NodeKind::IfCondition
            | NodeKind::ThenStatement
            | NodeKind::ElseStatement
            | NodeKind::WhileStatement
            | NodeKind::WhileCondition
            | NodeKind::WhileBody
            | NodeKind::IdAssignment
            | NodeKind::ArrayAssignment
            | NodeKind::CallExpression
            | NodeKind::MemberArgs
            | NodeKind::Length => {
                self.diagnostics.push(
                    Diagnostic::todo(file!(), line!())
                        .with_context("kind", &format!("{:?}", tree.kind(id))),
                );
                ExprType::Invalid
            }
        }
    }

    /// `this` has the type of the declared class, which is also assignable
    /// wherever the superclass is expected.
    fn check_this(&mut self, tree: &SyntaxTree, ctx: &MethodContext, id: NodeId) -> ExprType {
        if ctx.is_static() {
            self.diagnostics.push(Diagnostic::problem(
                Problem::ThisInStaticMethod,
                label(tree, id, "this"),
            ));
            return ExprType::Invalid;
        }
        match self.table.class_name() {
            Some(name) => ExprType::Resolved(Type::class(name)),
            None => ExprType::Invalid,
        }
    }

    fn check_identifier(&mut self, tree: &SyntaxTree, ctx: &MethodContext, id: NodeId) -> ExprType {
        let Some(name) = tree.identifier(id) else {
            return ExprType::Invalid;
        };
        match self.table.resolve(&ctx.method, name) {
            None => {
                self.diagnostics.push(
                    Diagnostic::problem(Problem::VariableNotDeclared, label(tree, id, "Identifier"))
                        .with_context("variable", name),
                );
                ExprType::Invalid
            }
            Some(Binding::Local(symbol)) => {
                if !ctx.assigned.contains(name) {
                    self.diagnostics.push(
                        Diagnostic::problem(Problem::VariableNotInitialized, label(tree, id, "Identifier"))
                            .with_context("variable", name),
                    );
                    return ExprType::Invalid;
                }
                ExprType::Resolved(symbol.ty)
            }
            Some(Binding::Field(_)) if ctx.is_static() => {
                self.diagnostics.push(
                    Diagnostic::problem(Problem::FieldInStaticMethod, label(tree, id, "Identifier"))
                        .with_context("field", name),
                );
                ExprType::Invalid
            }
            Some(binding) => ExprType::Resolved(binding.ty()),
        }
    }

    fn check_binary(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) -> ExprType {
        let (Some(left), Some(right)) = (tree.child(id, 0), tree.child(id, 1)) else {
            return ExprType::Invalid;
        };
        let Some(kind) = tree.attribute(id, "op").and_then(BinaryKind::from_name) else {
            self.diagnostics.push(
                Diagnostic::todo(file!(), line!())
                    .with_context("op", tree.attribute(id, "op").unwrap_or("")),
            );
            return ExprType::Invalid;
        };
        let left_type = self.visit_expression(tree, ctx, left);
        let right_type = self.visit_expression(tree, ctx, right);
        if left_type.is_invalid() || right_type.is_invalid() {
            return ExprType::Resolved(kind.result_type());
        }

        if let (Some(l), Some(r)) = (left_type.resolved(), right_type.resolved()) {
            if l != r {
                self.diagnostics.push(
                    Diagnostic::problem(Problem::BinaryOperandMismatch, label(tree, id, "Operation"))
                        .with_context("left", &l.to_string())
                        .with_context("right", &r.to_string()),
                );
                return ExprType::Invalid;
            }
        }

        let operand = kind.operand_type();
        for side in [&left_type, &right_type] {
            if !self.accepts(&operand, side) {
                let problem = if kind.is_logical() {
                    Problem::LogicalOperandNotBoolean
                } else {
                    Problem::ArithmeticOperandNotInt
                };
                self.diagnostics.push(
                    Diagnostic::problem(problem, label(tree, id, "Operation"))
                        .with_context("found", &side.token()),
                );
                return ExprType::Invalid;
            }
        }
        ExprType::Resolved(kind.result_type())
    }

    fn check_not(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) -> ExprType {
        let Some(operand) = tree.child(id, 0) else {
            return ExprType::Invalid;
        };
        let operand_type = self.visit_expression(tree, ctx, operand);
        if !self.accepts(&Type::boolean(), &operand_type) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::NotOperandNotBoolean, label(tree, id, "Negation"))
                    .with_context("found", &operand_type.token()),
            );
            return ExprType::Invalid;
        }
        ExprType::boolean()
    }

    fn check_index(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) -> ExprType {
        let (Some(array), Some(index)) = (tree.child(id, 0), tree.child(id, 1)) else {
            return ExprType::Invalid;
        };
        let array_type = self.visit_expression(tree, ctx, array);
        let index_type = self.visit_expression(tree, ctx, index);
        if array_type.is_invalid() || index_type.is_invalid() {
            return ExprType::Invalid;
        }

        if let Some(ty) = array_type.resolved() {
            if !ty.is_array() {
                self.diagnostics.push(
                    Diagnostic::problem(Problem::IndexedNotArray, label(tree, array, "Array"))
                        .with_context("type", &ty.to_string()),
                );
                return ExprType::Invalid;
            }
        }
        if !self.accepts(&Type::int(), &index_type) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::ArrayIndexNotInt, label(tree, index, "Index"))
                    .with_context("found", &index_type.token()),
            );
            return ExprType::Invalid;
        }
        match array_type {
            ExprType::Resolved(ty) => ExprType::Resolved(ty.element()),
            _ => ExprType::int(),
        }
    }

    fn check_new_array(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) -> ExprType {
        let Some(size) = tree.child(id, 0) else {
            return ExprType::Invalid;
        };
        let size_type = self.visit_expression(tree, ctx, size);
        if !self.accepts(&Type::int(), &size_type) {
            self.diagnostics.push(
                Diagnostic::problem(Problem::ArraySizeNotInt, label(tree, size, "Array size"))
                    .with_context("found", &size_type.token()),
            );
            return ExprType::Invalid;
        }
        ExprType::Resolved(Type::int_array())
    }

    fn check_new_object(&mut self, tree: &SyntaxTree, id: NodeId) -> ExprType {
        let Some(name) = tree.attribute(id, "name") else {
            return ExprType::Invalid;
        };
        if Some(name) == self.table.class_name()
            || Some(name) == self.table.super_name()
            || self.table.is_import(name)
        {
            return ExprType::Resolved(Type::class(name));
        }
        self.diagnostics.push(
            Diagnostic::problem(Problem::UndefinedType, label(tree, id, "Object creation"))
                .with_context("type", name),
        );
        ExprType::Invalid
    }

    fn check_access(&mut self, tree: &mut SyntaxTree, ctx: &mut MethodContext, id: NodeId) -> ExprType {
        let (Some(receiver), Some(member)) = (tree.child(id, 0), tree.child(id, 1)) else {
            return ExprType::Invalid;
        };
        match tree.kind(member) {
            NodeKind::Length => {
                let receiver_type = self.visit_expression(tree, ctx, receiver);
                match receiver_type.resolved() {
                    Some(ty) if !ty.is_array() => {
                        self.diagnostics.push(
                            Diagnostic::problem(Problem::LengthOnNonArray, label(tree, id, "Length"))
                                .with_context("type", &ty.to_string()),
                        );
                        ExprType::Invalid
                    }
                    _ if receiver_type.is_invalid() => ExprType::Invalid,
                    _ => ExprType::int(),
                }
            }
            NodeKind::CallExpression => self.check_call(tree, ctx, receiver, member),
            _ => {
                self.diagnostics.push(
                    Diagnostic::todo(file!(), line!())
                        .with_context("kind", &format!("{:?}", tree.kind(member))),
                );
                ExprType::Invalid
            }
        }
    }

    fn check_call(
        &mut self,
        tree: &mut SyntaxTree,
        ctx: &mut MethodContext,
        receiver: NodeId,
        call: NodeId,
    ) -> ExprType {
        let Some(name) = tree.child_identifier(call).map(str::to_string) else {
            return ExprType::Invalid;
        };
        let receiver_type = self.visit_expression(tree, ctx, receiver);

        let arg_nodes: Vec<NodeId> = tree
            .first_child_of_kind(call, NodeKind::MemberArgs)
            .map(|args| tree.children(args).to_vec())
            .unwrap_or_default();
        let mut args = vec![];
        for arg in arg_nodes {
            args.push(self.visit_expression(tree, ctx, arg));
        }

        let receiver_class = match receiver_type {
            ExprType::Invalid => return ExprType::Invalid,
            ExprType::InheritedUnknown => return ExprType::InheritedUnknown,
            ExprType::ImportUnknown => return ExprType::ImportUnknown,
            ExprType::Resolved(ty) => ty,
        };
        if !receiver_class.is_object() {
            self.diagnostics.push(
                Diagnostic::problem(Problem::MethodOnNonObject, label(tree, call, "Method call"))
                    .with_context("method", &name)
                    .with_context("type", &receiver_class.to_string()),
            );
            return ExprType::Invalid;
        }

        let table = self.table;
        let class_name = receiver_class.name();
        if Some(class_name) == table.class_name() || Some(class_name) == table.super_name() {
            self.resolve_own_method(tree, call, &name, &args)
        } else if table.is_import(class_name) {
            ExprType::ImportUnknown
        } else {
            // the undefined type is reported where the variable is declared
            ExprType::Invalid
        }
    }

    /// Resolves a call to a method that the class declares, or that it may
    /// inherit from the superclass.
    fn resolve_own_method(&mut self, tree: &SyntaxTree, call: NodeId, name: &str, args: &[ExprType]) -> ExprType {
        let table = self.table;
        let candidates: Vec<&Method> = table.methods_named(name).collect();
        if candidates.is_empty() {
            if table.super_name().is_some() {
                return ExprType::InheritedUnknown;
            }
            self.diagnostics.push(
                Diagnostic::problem(Problem::MethodNotDeclared, label(tree, call, "Method call"))
                    .with_context("method", name),
            );
            return ExprType::Invalid;
        }

        let same_arity: Vec<&Method> = candidates
            .iter()
            .copied()
            .filter(|method| method.parameters().len() == args.len())
            .collect();
        let Some(first) = same_arity.first() else {
            self.diagnostics.push(
                Diagnostic::problem(Problem::MethodWrongArgumentCount, label(tree, call, "Method call"))
                    .with_context("method", name)
                    .with_context("expected", &candidates[0].parameters().len().to_string())
                    .with_context("found", &args.len().to_string()),
            );
            return ExprType::Invalid;
        };

        for method in &same_arity {
            let matches = method
                .parameters()
                .iter()
                .zip(args)
                .all(|(param, arg)| self.accepts(&param.ty, arg));
            if matches {
                return ExprType::Resolved(method.return_type().clone());
            }
        }

        if let Some((position, (param, arg))) = first
            .parameters()
            .iter()
            .zip(args)
            .enumerate()
            .find(|(_, (param, arg))| !self.accepts(&param.ty, arg))
        {
            self.diagnostics.push(
                Diagnostic::problem(Problem::MethodWrongArgumentType, label(tree, call, "Method call"))
                    .with_context("method", name)
                    .with_context("position", &position.to_string())
                    .with_context("expected", &param.ty.to_string())
                    .with_context("found", &arg.token()),
            );
        }
        ExprType::Invalid
    }

    /// Returns true when a value of type `actual` may be stored where
    /// `expected` is declared.
    fn accepts(&self, expected: &Type, actual: &ExprType) -> bool {
        match actual {
            ExprType::Resolved(actual) => self.is_assignable(expected, actual),
            ExprType::InheritedUnknown | ExprType::ImportUnknown => {
                self.policy.accepts_unknown(expected)
            }
            ExprType::Invalid => true,
        }
    }

    fn is_assignable(&self, expected: &Type, actual: &Type) -> bool {
        if expected == actual {
            return true;
        }
        // an int may be stored into an int[] variable
        if expected == &Type::int_array() && actual.is_int() {
            return true;
        }
        if !expected.is_object() || !actual.is_object() {
            return false;
        }
        let class_name = self.table.class_name();
        if self.table.is_import(actual.name()) {
            // imported objects never become the declared class
            return Some(expected.name()) != class_name;
        }
        let extends = self.table.super_name().is_some()
            && (Some(actual.name()) == class_name || Some(actual.name()) == self.table.super_name());
        extends
    }
}
