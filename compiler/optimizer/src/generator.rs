//! Lowers the class, its methods and their statements.
//!
//! Statements are lowered in source order into the method's instruction
//! list. Control flow becomes conditional branches and jumps between labels:
//!
//! ```text
//! if (C) T else E          while (C) B
//!
//!   if (C) goto Then0        Loop0:
//!   E                          if (C) goto Body1
//!   goto After1                goto End2
//! Then0:                     Body1:
//!   T                          B
//! After1:                      goto Loop0
//!                            End2:
//! ```
use jmmc_analyzer::{
    symbol_table::{Binding, ClassTable},
    symbol_table_builder::method_from_node,
};
use jmmc_dsl::{
    diagnostic::{Diagnostic, Label, Stage, StageOutput},
    ir::{self, AccessModifier, Element, Instruction, Program, Variable},
    syntax::{NodeId, NodeKind, SyntaxTree},
    types::Type,
};
use jmmc_problems::Problem;
use log::{debug, trace};

use crate::{context::MethodContext, expression::into_variable};

/// Options of the lowering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Places operator conditions directly in conditional branches instead
    /// of evaluating them into a temporary first.
    pub optimize: bool,
}

/// Lowers the type checked tree to an IR program.
///
/// Identifiers that do not resolve are reported with the optimization stage
/// and produce no instruction.
pub fn generate(tree: &SyntaxTree, table: &ClassTable, options: &GeneratorOptions) -> StageOutput<Program> {
    let mut generator = IrGenerator {
        tree,
        table,
        options: *options,
        diagnostics: vec![],
    };
    let program = generator.program();
    debug!(
        "Generated IR for {}: {} fields, {} methods, {} diagnostics",
        program.class_name,
        program.fields.len(),
        program.methods.len(),
        generator.diagnostics.len()
    );
    StageOutput::new(program, generator.diagnostics)
}

pub(crate) struct IrGenerator<'a> {
    pub tree: &'a SyntaxTree,
    pub table: &'a ClassTable,
    pub options: GeneratorOptions,
    pub diagnostics: Vec<Diagnostic>,
}

impl IrGenerator<'_> {
    fn program(&mut self) -> Program {
        let table = self.table;
        let class_name = table.class_name().unwrap_or_default().to_string();

        let fields = table
            .fields()
            .map(|field| ir::Field::new(field.name.clone(), field.ty.clone()))
            .collect();

        let mut methods = vec![ir::Method::constructor(&class_name)];
        if let Some(class) = self
            .tree
            .root()
            .and_then(|root| self.tree.first_child_of_kind(root, NodeKind::ClassDeclaration))
        {
            for member in self.tree.children(class) {
                if self.tree.kind(*member).is_method() {
                    if let Some(method) = self.method(*member) {
                        methods.push(method);
                    }
                }
            }
        }

        Program {
            imports: table.imports().to_vec(),
            class_name,
            super_name: table.super_name().map(str::to_string),
            fields,
            methods,
        }
    }

    fn method(&mut self, id: NodeId) -> Option<ir::Method> {
        let declared = method_from_node(self.tree, id)?;
        let method = self
            .table
            .method(&declared.signature())
            .cloned()
            .unwrap_or(declared);
        trace!("Lowering method {}", method.signature());

        let params = method
            .parameters()
            .iter()
            .map(|param| Variable::new(param.name.clone(), param.ty.clone()))
            .collect();
        let mut result = ir::Method::new(method.name(), params, method.return_type().clone());
        result.access = AccessModifier::Public;
        result.is_static = method.is_static();

        let mut ctx = MethodContext::new(method);
        if let Some(body) = self.tree.first_child_of_kind(id, NodeKind::MethodBody) {
            for statement in self.tree.children(body) {
                self.statement(&mut ctx, *statement);
            }
        }

        match self.tree.first_child_of_kind(id, NodeKind::ReturnExpression) {
            Some(ret) => {
                let expected = ctx.method.return_type().clone();
                if let Some(value) = self
                    .tree
                    .child(ret, 0)
                    .and_then(|expression| self.element(&mut ctx, expression, Some(&expected)))
                {
                    ctx.push(Instruction::Return { value: Some(value) });
                }
            }
            None => ctx.push(Instruction::Return { value: None }),
        }

        let (instructions, labels) = ctx.finish();
        result.instructions = instructions;
        result.labels = labels;
        Some(result)
    }

    pub(crate) fn statement(&mut self, ctx: &mut MethodContext, id: NodeId) {
        match self.tree.kind(id) {
            NodeKind::VarDeclaration => {}
            NodeKind::ScopeStatement
            | NodeKind::ThenStatement
            | NodeKind::ElseStatement
            | NodeKind::WhileBody => {
                for child in self.tree.children(id) {
                    self.statement(ctx, *child);
                }
            }
            NodeKind::ExpressionStatement => {
                if let Some(expression) = self.tree.child(id, 0) {
                    self.expression_statement(ctx, expression);
                }
            }
            NodeKind::IfStatement => self.if_statement(ctx, id),
            NodeKind::WhileStatement => self.while_statement(ctx, id),
            NodeKind::IdAssignment => self.assignment(ctx, id),
            NodeKind::ArrayAssignment => self.array_assignment(ctx, id),
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
            | NodeKind::IfCondition
            | NodeKind::WhileCondition
            | NodeKind::BinOp
            | NodeKind::UnaryOp
            | NodeKind::ArrayExpression
            | NodeKind::AccessExpression
            | NodeKind::CallExpression
            | NodeKind::MemberArgs
            | NodeKind::Length
            | NodeKind::ParenthesisExpression
            | NodeKind::Literal
            | NodeKind::This
            | NodeKind::NewArray
            | NodeKind::NewObject
            | NodeKind::Id => {
                self.diagnostics.push(
                    Diagnostic::todo(file!(), line!())
                        .with_stage(Stage::Optimization)
                        .with_context("kind", &format!("{:?}", self.tree.kind(id))),
                );
            }
        }
    }

    /// A call used as a statement keeps its instruction; the value of any
    /// other expression is dropped after its operands are evaluated.
    fn expression_statement(&mut self, ctx: &mut MethodContext, id: NodeId) {
        if let Some(instruction @ Instruction::Call(_)) = self.rhs(ctx, id, None) {
            ctx.push(instruction);
        }
    }

    fn if_statement(&mut self, ctx: &mut MethodContext, id: NodeId) {
        let then_label = ctx.label("Then");
        let after_label = ctx.label("After");

        let condition = self
            .tree
            .first_child_of_kind(id, NodeKind::IfCondition)
            .and_then(|c| self.tree.child(c, 0));
        if let Some(condition) = condition.and_then(|c| self.condition(ctx, c)) {
            ctx.push(Instruction::CondBranch {
                condition: Box::new(condition),
                label: then_label.clone(),
            });
        }

        if let Some(otherwise) = self.tree.first_child_of_kind(id, NodeKind::ElseStatement) {
            self.statement(ctx, otherwise);
        }
        ctx.push(Instruction::Goto {
            label: after_label.clone(),
        });

        ctx.mark(then_label);
        if let Some(then) = self.tree.first_child_of_kind(id, NodeKind::ThenStatement) {
            self.statement(ctx, then);
        }
        ctx.mark(after_label);
    }

    fn while_statement(&mut self, ctx: &mut MethodContext, id: NodeId) {
        let loop_label = ctx.label("Loop");
        let body_label = ctx.label("Body");
        let end_label = ctx.label("End");

        ctx.mark(loop_label.clone());
        let condition = self
            .tree
            .first_child_of_kind(id, NodeKind::WhileCondition)
            .and_then(|c| self.tree.child(c, 0));
        if let Some(condition) = condition.and_then(|c| self.condition(ctx, c)) {
            ctx.push(Instruction::CondBranch {
                condition: Box::new(condition),
                label: body_label.clone(),
            });
        }
        ctx.push(Instruction::Goto {
            label: end_label.clone(),
        });

        ctx.mark(body_label);
        if let Some(body) = self.tree.first_child_of_kind(id, NodeKind::WhileBody) {
            self.statement(ctx, body);
        }
        ctx.push(Instruction::Goto { label: loop_label });
        ctx.mark(end_label);
    }

    /// The condition of a branch. Without `optimize` the condition is first
    /// evaluated into a boolean temporary.
    fn condition(&mut self, ctx: &mut MethodContext, id: NodeId) -> Option<Instruction> {
        let id = self.strip_parentheses(id);
        let is_operation = matches!(self.tree.kind(id), NodeKind::BinOp | NodeKind::UnaryOp);
        if self.options.optimize && is_operation {
            return self.rhs(ctx, id, Some(&Type::boolean()));
        }
        let rhs = self.rhs(ctx, id, Some(&Type::boolean()))?;
        let temp = ctx.assign_temp(Type::boolean(), rhs);
        Some(Instruction::NoOp {
            operand: Element::Variable(temp),
        })
    }

    fn assignment(&mut self, ctx: &mut MethodContext, id: NodeId) {
        let (Some(target), Some(value)) = (self.tree.child(id, 0), self.tree.child(id, 1)) else {
            return;
        };
        let Some(binding) = self.resolve(ctx, target) else {
            return;
        };
        let ty = binding.ty();
        match binding {
            Binding::Local(symbol) | Binding::Parameter(_, symbol) => {
                if let Some(rhs) = self.rhs(ctx, value, Some(&ty)) {
                    ctx.push(Instruction::Assign {
                        dest: Element::Variable(Variable::new(symbol.name, symbol.ty)),
                        rhs: Box::new(rhs),
                    });
                }
            }
            Binding::Field(symbol) => {
                if let Some(value) = self.element(ctx, value, Some(&ty)) {
                    ctx.push(Instruction::PutField {
                        object: self.this(),
                        field: Variable::new(symbol.name, symbol.ty),
                        value,
                    });
                }
            }
            Binding::Import(name) => self.unresolved(target, &name),
        }
    }

    fn array_assignment(&mut self, ctx: &mut MethodContext, id: NodeId) {
        let (Some(target), Some(index), Some(value)) =
            (self.tree.child(id, 0), self.tree.child(id, 1), self.tree.child(id, 2))
        else {
            return;
        };
        let Some(array) = self.element(ctx, target, Some(&Type::int_array())) else {
            return;
        };
        let array = into_variable(ctx, array);
        let Some(dest) = self.array_element(ctx, array, index) else {
            return;
        };
        let Some(value) = self.element(ctx, value, Some(&Type::int())) else {
            return;
        };
        ctx.push(Instruction::Assign {
            dest,
            rhs: Box::new(Instruction::NoOp { operand: value }),
        });
    }

    /// Resolves the identifier node in the method. Reports the identifier
    /// when it does not resolve.
    pub(crate) fn resolve(&mut self, ctx: &MethodContext, id: NodeId) -> Option<Binding> {
        let name = self.tree.identifier(id)?;
        let binding = self.table.resolve(&ctx.method, name);
        if binding.is_none() {
            let name = name.to_string();
            self.unresolved(id, &name);
        }
        binding
    }

    fn unresolved(&mut self, id: NodeId, name: &str) {
        self.diagnostics.push(
            Diagnostic::problem(
                Problem::UnresolvedIdentifier,
                Label::at(self.tree.position(id), "Identifier"),
            )
            .with_stage(Stage::Optimization)
            .with_context("identifier", name),
        );
    }

    pub(crate) fn this(&self) -> Element {
        Element::Variable(Variable::this(self.table.class_name().unwrap_or_default()))
    }

    pub(crate) fn strip_parentheses(&self, mut id: NodeId) -> NodeId {
        while self.tree.kind(id) == NodeKind::ParenthesisExpression {
            match self.tree.child(id, 0) {
                Some(inner) => id = inner,
                None => break,
            }
        }
        id
    }
}
