//! Lowers expressions.
//!
//! An expression lowers either to an [`Element`] that can be used directly
//! as an operand, or to an [`Instruction`] that computes the value and is
//! the right side of an assignment. Nested operations are assigned to
//! temporaries first so that every instruction has simple operands.
use jmmc_analyzer::{symbol_table::Binding, type_resolution::ExprType};
use jmmc_dsl::{
    diagnostic::{Diagnostic, Stage},
    ir::{BinaryOperator, Call, CallKind, Element, Instruction, UnaryOperator, Variable},
    syntax::{NodeId, NodeKind, INFERRED_TYPE},
    types::Type,
};
use phf::phf_map;

use crate::{context::MethodContext, generator::IrGenerator};

static BINARY_OPERATORS: phf::Map<&'static str, BinaryOperator> = phf_map! {
    "Add" => BinaryOperator::Add,
    "Sub" => BinaryOperator::Sub,
    "Mult" => BinaryOperator::Mul,
    "Div" => BinaryOperator::Div,
    "Less" => BinaryOperator::Lth,
    "And" => BinaryOperator::And,
    "Or" => BinaryOperator::Or,
};

fn operand_type(op: BinaryOperator) -> Type {
    match op {
        BinaryOperator::And | BinaryOperator::Or => Type::boolean(),
        _ => Type::int(),
    }
}

fn same_type(param: &Type, arg: &Type) -> bool {
    param == arg
}

/// Whether an argument of type `arg` is accepted by a parameter of type
/// `param`. Objects are passed to any object parameter and an int to an
/// int array, as the type checker allows.
fn fits_parameter(param: &Type, arg: &Type) -> bool {
    param == arg || (param == &Type::int_array() && arg.is_int()) || (param.is_object() && arg.is_object())
}

/// Returns the element as a variable, assigning it to a temporary when it
/// is a literal or an array element.
pub(crate) fn into_variable(ctx: &mut MethodContext, element: Element) -> Variable {
    match element {
        Element::Variable(variable) => variable,
        other => {
            let ty = other.ty().clone();
            ctx.assign_temp(ty, Instruction::NoOp { operand: other })
        }
    }
}

impl IrGenerator<'_> {
    /// Lowers the expression to an operand. `hint` is the type the consumer
    /// expects, used when neither the type checker nor the lowering can tell
    /// the type of a temporary.
    pub(crate) fn element(
        &mut self,
        ctx: &mut MethodContext,
        id: NodeId,
        hint: Option<&Type>,
    ) -> Option<Element> {
        let id = self.strip_parentheses(id);
        match self.tree.kind(id) {
            NodeKind::Literal => self.literal(id),
            NodeKind::This => Some(self.this()),
            NodeKind::Id => self.identifier(ctx, id),
            NodeKind::NewObject => self.new_object(ctx, id).map(Element::Variable),
            NodeKind::BinOp
            | NodeKind::UnaryOp
            | NodeKind::ArrayExpression
            | NodeKind::AccessExpression
            | NodeKind::NewArray => {
                let rhs = self.rhs(ctx, id, hint)?;
                let ty = self.inferred_type(id).unwrap_or_else(|| {
                    let ty = rhs.result_type();
                    match hint {
                        Some(hint) if ty.is_void() => hint.clone(),
                        _ => ty,
                    }
                });
                Some(Element::Variable(ctx.assign_temp(ty, rhs)))
            }
            _ => {
                self.not_an_expression(id);
                None
            }
        }
    }

    /// Lowers the expression to the instruction that computes it.
    pub(crate) fn rhs(
        &mut self,
        ctx: &mut MethodContext,
        id: NodeId,
        hint: Option<&Type>,
    ) -> Option<Instruction> {
        let id = self.strip_parentheses(id);
        match self.tree.kind(id) {
            NodeKind::BinOp => {
                let Some(op) = self
                    .tree
                    .attribute(id, "op")
                    .and_then(|op| BINARY_OPERATORS.get(op))
                    .copied()
                else {
                    self.not_an_expression(id);
                    return None;
                };
                let (left, right) = (self.tree.child(id, 0)?, self.tree.child(id, 1)?);
                let operand = operand_type(op);
                let left = self.element(ctx, left, Some(&operand))?;
                let right = self.element(ctx, right, Some(&operand))?;
                Some(Instruction::BinaryOp { op, left, right })
            }
            NodeKind::UnaryOp => {
                let operand = self.tree.child(id, 0)?;
                let operand = self.element(ctx, operand, Some(&Type::boolean()))?;
                Some(Instruction::UnaryOp {
                    op: UnaryOperator::Not,
                    operand,
                })
            }
            NodeKind::ArrayExpression => {
                let (array, index) = (self.tree.child(id, 0)?, self.tree.child(id, 1)?);
                let array = self.element(ctx, array, Some(&Type::int_array()))?;
                let array = into_variable(ctx, array);
                let operand = self.array_element(ctx, array, index)?;
                Some(Instruction::NoOp { operand })
            }
            NodeKind::AccessExpression => {
                let (receiver, member) = (self.tree.child(id, 0)?, self.tree.child(id, 1)?);
                match self.tree.kind(member) {
                    NodeKind::Length => {
                        let target = self.element(ctx, receiver, Some(&Type::int_array()))?;
                        Some(Instruction::Call(Call {
                            kind: CallKind::ArrayLength,
                            target,
                            method: None,
                            args: vec![],
                            param_types: None,
                            return_type: Type::int(),
                        }))
                    }
                    NodeKind::CallExpression => self.call(ctx, id, receiver, member, hint),
                    _ => {
                        self.not_an_expression(member);
                        None
                    }
                }
            }
            NodeKind::NewArray => {
                let size = self.tree.child(id, 0)?;
                let size = self.element(ctx, size, Some(&Type::int()))?;
                Some(Instruction::Call(Call {
                    kind: CallKind::New,
                    target: Element::variable("array", Type::int_array()),
                    method: None,
                    args: vec![size],
                    param_types: None,
                    return_type: Type::int_array(),
                }))
            }
            NodeKind::NewObject => {
                let object = self.new_object(ctx, id)?;
                Some(Instruction::NoOp {
                    operand: Element::Variable(object),
                })
            }
            NodeKind::Literal | NodeKind::This | NodeKind::Id => {
                let operand = self.element(ctx, id, hint)?;
                Some(Instruction::NoOp { operand })
            }
            _ => {
                self.not_an_expression(id);
                None
            }
        }
    }

    /// `array[index]`. The element is `Invalid` typed when the index is not
    /// an int.
    pub(crate) fn array_element(
        &mut self,
        ctx: &mut MethodContext,
        array: Variable,
        index: NodeId,
    ) -> Option<Element> {
        let index = self.element(ctx, index, Some(&Type::int()))?;
        let index = into_variable(ctx, index);
        let ty = if index.ty.is_int() {
            array.ty.element()
        } else {
            Type::invalid()
        };
        Some(Element::ArrayElement {
            array,
            index: Box::new(Element::Variable(index)),
            ty,
        })
    }

    fn literal(&mut self, id: NodeId) -> Option<Element> {
        let value = self.tree.attribute(id, "value").unwrap_or_default();
        if self.tree.attribute(id, "type") == Some("boolean") {
            return Some(Element::boolean(value == "true"));
        }
        match value.parse::<i32>() {
            Ok(value) => Some(Element::int(value)),
            Err(_) => {
                self.diagnostics.push(
                    Diagnostic::todo(file!(), line!())
                        .with_stage(Stage::Optimization)
                        .with_context("literal", value),
                );
                None
            }
        }
    }

    /// Locals and parameters are used directly; fields are read into a
    /// temporary through the implicit receiver.
    fn identifier(&mut self, ctx: &mut MethodContext, id: NodeId) -> Option<Element> {
        match self.resolve(ctx, id)? {
            Binding::Local(symbol) | Binding::Parameter(_, symbol) => {
                Some(Element::Variable(Variable::new(symbol.name, symbol.ty)))
            }
            Binding::Field(symbol) => {
                let ty = symbol.ty.clone();
                let field = Variable::new(symbol.name, symbol.ty);
                let temp = ctx.assign_temp(
                    ty,
                    Instruction::GetField {
                        object: self.this(),
                        field,
                    },
                );
                Some(Element::Variable(temp))
            }
            Binding::Import(name) => Some(Element::variable(name.clone(), Type::class(name))),
        }
    }

    /// Allocates the object into a temporary and calls its constructor.
    fn new_object(&mut self, ctx: &mut MethodContext, id: NodeId) -> Option<Variable> {
        let name = self.tree.attribute(id, "name")?;
        let ty = Type::class(name);
        let object = ctx.assign_temp(
            ty.clone(),
            Instruction::Call(Call {
                kind: CallKind::New,
                target: Element::variable(name, ty.clone()),
                method: None,
                args: vec![],
                param_types: None,
                return_type: ty,
            }),
        );
        ctx.push(Instruction::Call(Call {
            kind: CallKind::Special,
            target: Element::Variable(object.clone()),
            method: Some("<init>".to_string()),
            args: vec![],
            param_types: None,
            return_type: Type::void(),
        }));
        Some(object)
    }

    /// `receiver.name(args)`. Calls through an imported class name are
    /// static, all others are virtual.
    fn call(
        &mut self,
        ctx: &mut MethodContext,
        access: NodeId,
        receiver: NodeId,
        call: NodeId,
        hint: Option<&Type>,
    ) -> Option<Instruction> {
        let name = self.tree.child_identifier(call)?.to_string();
        let receiver = self.strip_parentheses(receiver);
        let is_static = self
            .tree
            .identifier(receiver)
            .map(|id| matches!(self.table.resolve(&ctx.method, id), Some(Binding::Import(_))))
            .unwrap_or(false);
        let target = self.element(ctx, receiver, None)?;

        let arg_ids: Vec<NodeId> = self
            .tree
            .first_child_of_kind(call, NodeKind::MemberArgs)
            .map(|member_args| self.tree.children(member_args).to_vec())
            .unwrap_or_default();
        let expected = self
            .declared_signatures(&target, &name, arg_ids.len())
            .into_iter()
            .next()
            .map(|(params, _)| params);

        // A result whose type nobody knows is an int, never a void value
        let mut args = vec![];
        for (position, arg) in arg_ids.into_iter().enumerate() {
            let hint = expected
                .as_ref()
                .and_then(|types| types.get(position).cloned())
                .unwrap_or_else(Type::int);
            args.push(self.element(ctx, arg, Some(&hint))?);
        }

        let declared = self.declared_signature(&target, &name, &args);
        let (param_types, return_type) = match declared {
            Some((params, return_type)) => (Some(params), return_type),
            None => (
                None,
                self.inferred_type(access)
                    .or_else(|| hint.cloned())
                    .unwrap_or_else(Type::void),
            ),
        };

        Some(Instruction::Call(Call {
            kind: if is_static {
                CallKind::Static
            } else {
                CallKind::Virtual
            },
            target,
            method: Some(name),
            args,
            param_types,
            return_type,
        }))
    }

    /// Parameter and return types of the class's own methods with the name
    /// and number of parameters, when the call goes to an object of the
    /// class.
    fn declared_signatures(&self, target: &Element, name: &str, arity: usize) -> Vec<(Vec<Type>, Type)> {
        if Some(target.ty().name()) != self.table.class_name() {
            return vec![];
        }
        self.table
            .methods_named(name)
            .filter(|method| method.parameters().len() == arity)
            .map(|method| {
                let params = method.parameters().iter().map(|param| param.ty.clone()).collect();
                (params, method.return_type().clone())
            })
            .collect()
    }

    /// The signature of the method that the call selects: the one whose
    /// parameter types equal the argument types, else the first that takes
    /// the arguments, else the first with the same number of parameters.
    fn declared_signature(&self, target: &Element, name: &str, args: &[Element]) -> Option<(Vec<Type>, Type)> {
        let mut candidates = self.declared_signatures(target, name, args.len());
        let takes = |params: &[Type], fits: fn(&Type, &Type) -> bool| {
            params.iter().zip(args).all(|(param, arg)| fits(param, arg.ty()))
        };
        let selected = candidates
            .iter()
            .position(|(params, _)| takes(params.as_slice(), same_type))
            .or_else(|| candidates.iter().position(|(params, _)| takes(params.as_slice(), fits_parameter)));
        match selected {
            Some(position) => Some(candidates.swap_remove(position)),
            None => candidates.into_iter().next(),
        }
    }

    /// The type the type checker recorded for the node, when it is resolved.
    fn inferred_type(&self, id: NodeId) -> Option<Type> {
        let token = self.tree.attribute(id, INFERRED_TYPE)?;
        match ExprType::from_token(token) {
            ExprType::Resolved(ty) if !ty.is_invalid() => Some(ty),
            _ => None,
        }
    }

    fn not_an_expression(&mut self, id: NodeId) {
        self.diagnostics.push(
            Diagnostic::todo(file!(), line!())
                .with_stage(Stage::Optimization)
                .with_context("kind", &format!("{:?}", self.tree.kind(id))),
        );
    }
}
