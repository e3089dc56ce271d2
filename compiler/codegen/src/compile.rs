//! Compiles a three-address IR program into Jasmin assembly.
//!
//! Each method is lowered one IR instruction at a time. The operand stack
//! is empty at the start of every instruction, so the stack limit of a
//! method is the deepest expansion of any single instruction.
//!
//! # Idioms
//!
//! - `x := x + k`, `x := k + x` and `x := x - k` with the constant in the
//!   byte range become `iinc`.
//! - `t := new(C)` followed by `invokespecial(t, "<init>")` becomes
//!   `new`, `dup`, `invokespecial`, `astore`.
//! - Relational operators used as values are materialized with a branch
//!   over `iconst_0` and `iconst_1`.

use indexmap::IndexMap;
use jmmc_dsl::ir::{BinaryOperator, Call, CallKind, Element, Instruction, Method, Program, UnaryOperator, Variable};
use jmmc_dsl::types::Type;
use log::{debug, trace};

use crate::emit::{Comparison, Emitter, Invoke};
use crate::error::CodegenError;

const OBJECT_OWNER: &str = "java/lang/Object";

/// The Jasmin source of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JasminOutput {
    pub class_name: String,
    pub code: String,
}

/// Compiles the program into the Jasmin source of its class.
///
/// Returns an error when the program contains a construct that the
/// emitter does not lower, such as a value of the invalid type.
pub fn compile(program: &Program) -> Result<JasminOutput, CodegenError> {
    let mut ctx = CompileContext::new(program);
    let mut code = String::new();

    code.push_str(&format!(".class public {}\n", program.class_name));
    code.push_str(&format!(".super {}\n\n", ctx.super_owner()));

    for field in &program.fields {
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
        line.push_str(&format!("{} {}", field.name, ctx.value_descriptor(&field.ty)?));
        if let Some(value) = field.initial_value {
            line.push_str(&format!(" = {}", value));
        }
        line.push('\n');
        code.push_str(&line);
    }
    if !program.fields.is_empty() {
        code.push('\n');
    }

    for method in &program.methods {
        code.push_str(&compile_method(&mut ctx, method)?);
    }

    debug!(
        "Emitted {} methods for class {}",
        program.methods.len(),
        program.class_name
    );

    Ok(JasminOutput {
        class_name: program.class_name.clone(),
        code,
    })
}

/// Tracks state during compilation of a single class.
struct CompileContext<'a> {
    program: &'a Program,
    /// Numbers the labels that the idioms introduce. Shared by all methods
    /// of the class.
    label_counter: usize,
    /// Maps variable names of the current method to local slots.
    slots: IndexMap<String, u16>,
    is_constructor: bool,
}

impl<'a> CompileContext<'a> {
    fn new(program: &'a Program) -> Self {
        CompileContext {
            program,
            label_counter: 0,
            slots: IndexMap::new(),
            is_constructor: false,
        }
    }

    fn begin_method(&mut self, method: &Method) {
        self.slots = assign_slots(method);
        self.is_constructor = method.is_constructor;
    }

    fn next_label_id(&mut self) -> usize {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }

    fn slot(&self, name: &str) -> Result<u16, CodegenError> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| CodegenError::UndeclaredVariable(name.to_string()))
    }

    /// The internal name of a class: the import path with `/` separators,
    /// or the name itself.
    fn owner(&self, name: &str) -> String {
        if name == self.program.class_name {
            return name.to_string();
        }
        self.program
            .imports
            .iter()
            .find(|import| *import == name || import.rsplit('.').next() == Some(name))
            .map(|import| import.replace('.', "/"))
            .unwrap_or_else(|| name.to_string())
    }

    fn super_owner(&self) -> String {
        match &self.program.super_name {
            Some(name) => self.owner(name),
            None => OBJECT_OWNER.to_string(),
        }
    }

    /// The JVM field descriptor of the type.
    fn descriptor(&self, ty: &Type) -> Result<String, CodegenError> {
        if ty.is_invalid() {
            return Err(CodegenError::InvalidType(ty.to_string()));
        }
        let element = match ty.name() {
            "int" => "I".to_string(),
            "boolean" => "Z".to_string(),
            "void" => "V".to_string(),
            "String" => "Ljava/lang/String;".to_string(),
            other => format!("L{};", self.owner(other)),
        };
        if ty.is_array() {
            Ok(format!("[{}", element))
        } else {
            Ok(element)
        }
    }

    /// The descriptor of a type that holds a value, which excludes `void`.
    fn value_descriptor(&self, ty: &Type) -> Result<String, CodegenError> {
        if ty.is_void() {
            return Err(CodegenError::InvalidType(ty.to_string()));
        }
        self.descriptor(ty)
    }

    /// Parameter descriptors of an invocation: the declared parameter types
    /// when known, otherwise the argument types.
    fn parameter_descriptors(&self, call: &Call) -> Result<Vec<String>, CodegenError> {
        match &call.param_types {
            Some(types) => types.iter().map(|ty| self.value_descriptor(ty)).collect(),
            None => call
                .args
                .iter()
                .map(|arg| self.value_descriptor(arg.ty()))
                .collect(),
        }
    }
}

/// Assigns local slots: `this` is 0 for instance methods, then the
/// parameters, then every other variable in order of first appearance.
fn assign_slots(method: &Method) -> IndexMap<String, u16> {
    let mut slots = IndexMap::new();
    if !method.is_static {
        slots.insert("this".to_string(), 0);
    }
    for param in &method.params {
        let next = slots.len() as u16;
        slots.entry(param.name.clone()).or_insert(next);
    }
    for instruction in &method.instructions {
        collect_instruction(instruction, &mut slots);
    }
    slots
}

fn collect_instruction(instruction: &Instruction, slots: &mut IndexMap<String, u16>) {
    match instruction {
        Instruction::Assign { dest, rhs } => {
            collect_element(dest, slots);
            collect_instruction(rhs, slots);
        }
        Instruction::BinaryOp { left, right, .. } => {
            collect_element(left, slots);
            collect_element(right, slots);
        }
        Instruction::UnaryOp { operand, .. } | Instruction::NoOp { operand } => {
            collect_element(operand, slots);
        }
        Instruction::Call(call) => {
            // Static calls and allocations name a class, not a local
            if !matches!(call.kind, CallKind::Static | CallKind::New) {
                collect_element(&call.target, slots);
            }
            for arg in &call.args {
                collect_element(arg, slots);
            }
        }
        Instruction::GetField { object, .. } => collect_element(object, slots),
        Instruction::PutField { object, value, .. } => {
            collect_element(object, slots);
            collect_element(value, slots);
        }
        Instruction::CondBranch { condition, .. } => collect_instruction(condition, slots),
        Instruction::Return { value: Some(value) } => collect_element(value, slots),
        Instruction::Return { value: None } | Instruction::Goto { .. } => {}
    }
}

fn collect_element(element: &Element, slots: &mut IndexMap<String, u16>) {
    match element {
        Element::Literal { .. } => {}
        Element::Variable(variable) => collect_variable(variable, slots),
        Element::ArrayElement { array, index, .. } => {
            collect_variable(array, slots);
            collect_element(index, slots);
        }
    }
}

fn collect_variable(variable: &Variable, slots: &mut IndexMap<String, u16>) {
    if variable.is_this() {
        return;
    }
    let next = slots.len() as u16;
    slots.entry(variable.name.clone()).or_insert(next);
}

/// Compiles one method including its header and limits.
fn compile_method(ctx: &mut CompileContext, method: &Method) -> Result<String, CodegenError> {
    ctx.begin_method(method);
    let mut emitter = Emitter::new();

    let instructions = &method.instructions;
    let mut index = 0;
    while index < instructions.len() {
        for label in method.labels_at(index) {
            emitter.emit_label(label);
        }
        emitter.reset_stack_depth();
        index += compile_instruction(&mut emitter, ctx, &instructions[index], instructions.get(index + 1))?;
    }
    let mut trailing_label = false;
    for label in method.labels_at(instructions.len()) {
        emitter.emit_label(label);
        trailing_label = true;
    }

    let returns_nothing = method.is_constructor || method.return_type.is_void();
    if returns_nothing && (trailing_label || !emitter.ends_with_return()) {
        emitter.emit_return();
    }

    let mut header = String::from(".method ");
    if let Some(keyword) = method.access.keyword() {
        header.push_str(keyword);
        header.push(' ');
    }
    if method.is_static {
        header.push_str("static ");
    }
    let params = method
        .params
        .iter()
        .map(|param| ctx.value_descriptor(&param.ty))
        .collect::<Result<Vec<_>, _>>()?;

    let locals = ctx.slots.len().max(1);
    trace!(
        "Method {}: stack {}, locals {}",
        method.name,
        emitter.max_stack_depth(),
        locals
    );

    let mut code = String::new();
    code.push_str(&format!(
        "{}{}({}){}\n",
        header,
        method.name,
        params.concat(),
        ctx.descriptor(&method.return_type)?
    ));
    code.push_str(&format!("\t.limit stack {}\n", emitter.max_stack_depth()));
    code.push_str(&format!("\t.limit locals {}\n\n", locals));
    code.push_str(emitter.code());
    code.push_str(".end method\n\n");
    Ok(code)
}

/// Compiles one IR instruction.
///
/// Returns the number of instructions consumed, which is 2 when the
/// instruction forms an idiom with the next one.
fn compile_instruction(
    emitter: &mut Emitter,
    ctx: &mut CompileContext,
    instruction: &Instruction,
    next: Option<&Instruction>,
) -> Result<usize, CodegenError> {
    match instruction {
        Instruction::Assign { dest, rhs } => return compile_assign(emitter, ctx, dest, rhs, next),
        Instruction::Call(call) => {
            compile_call(emitter, ctx, call)?;
            if matches!(call.kind, CallKind::Virtual | CallKind::Static) && !call.return_type.is_void() {
                emitter.emit_pop();
            }
        }
        Instruction::PutField { object, field, value } => {
            compile_load(emitter, ctx, object)?;
            compile_load(emitter, ctx, value)?;
            let owner = ctx.owner(object.ty().name());
            emitter.emit_putfield(&owner, &field.name, &ctx.descriptor(&field.ty)?);
        }
        Instruction::Goto { label } => emitter.emit_goto(label),
        Instruction::CondBranch { condition, label } => compile_branch(emitter, ctx, condition, label)?,
        Instruction::Return { value: Some(value) } => {
            compile_load(emitter, ctx, value)?;
            if value.ty().is_int_like() {
                emitter.emit_ireturn();
            } else {
                emitter.emit_areturn();
            }
        }
        Instruction::Return { value: None } => emitter.emit_return(),
        Instruction::NoOp { .. } => {}
        Instruction::BinaryOp { .. } | Instruction::UnaryOp { .. } | Instruction::GetField { .. } => {
            compile_value(emitter, ctx, instruction)?;
            emitter.emit_pop();
        }
    }
    Ok(1)
}

fn compile_assign(
    emitter: &mut Emitter,
    ctx: &mut CompileContext,
    dest: &Element,
    rhs: &Instruction,
    next: Option<&Instruction>,
) -> Result<usize, CodegenError> {
    match dest {
        Element::Variable(variable) => {
            if let Some((slot, value)) = increment(ctx, variable, rhs) {
                emitter.emit_iinc(slot, value);
                return Ok(1);
            }
            if let Instruction::Call(call) = rhs {
                if call.kind == CallKind::New && !call.return_type.is_array() {
                    let owner = ctx.owner(call.target.ty().name());
                    emitter.emit_new(&owner);
                    let consumed = if is_constructor_of(next, variable) {
                        emitter.emit_dup();
                        emitter.emit_invoke(Invoke::Special, &owner, "<init>", &[], "V");
                        2
                    } else {
                        1
                    };
                    compile_store(emitter, ctx, variable)?;
                    return Ok(consumed);
                }
            }
            compile_value(emitter, ctx, rhs)?;
            compile_store(emitter, ctx, variable)?;
            Ok(1)
        }
        Element::ArrayElement { array, index, ty } => {
            if ty.is_invalid() {
                return Err(CodegenError::InvalidType(format!("{}[]", array.name)));
            }
            compile_load_variable(emitter, ctx, array)?;
            compile_load(emitter, ctx, index)?;
            compile_value(emitter, ctx, rhs)?;
            emitter.emit_iastore();
            Ok(1)
        }
        Element::Literal { value, .. } => Err(CodegenError::Unsupported(format!(
            "assignment to the literal {}",
            value
        ))),
    }
}

/// Matches the increment idiom and returns the slot and the constant.
fn increment(ctx: &CompileContext, variable: &Variable, rhs: &Instruction) -> Option<(u16, i32)> {
    if !variable.ty.is_int() {
        return None;
    }
    let Instruction::BinaryOp { op, left, right } = rhs else {
        return None;
    };
    let is_dest = |element: &Element| element.as_variable().map(|v| v.name == variable.name).unwrap_or(false);
    let value = match (op, left, right) {
        (BinaryOperator::Add, left, Element::Literal { value, .. }) if is_dest(left) => *value,
        (BinaryOperator::Add, Element::Literal { value, .. }, right) if is_dest(right) => *value,
        (BinaryOperator::Sub, left, Element::Literal { value, .. }) if is_dest(left) => value.checked_neg()?,
        _ => return None,
    };
    if !(-128..=127).contains(&value) {
        return None;
    }
    ctx.slot(&variable.name).ok().map(|slot| (slot, value))
}

/// Returns true when the instruction is the constructor call on the variable.
fn is_constructor_of(instruction: Option<&Instruction>, variable: &Variable) -> bool {
    match instruction {
        Some(Instruction::Call(call)) => {
            call.kind == CallKind::Special
                && call.method.as_deref() == Some("<init>")
                && call.target.as_variable().map(|target| target.name == variable.name) == Some(true)
        }
        _ => false,
    }
}

/// Compiles an instruction that leaves its value on the stack. Void calls
/// leave nothing.
fn compile_value(emitter: &mut Emitter, ctx: &mut CompileContext, instruction: &Instruction) -> Result<(), CodegenError> {
    match instruction {
        Instruction::NoOp { operand } => compile_load(emitter, ctx, operand),
        Instruction::BinaryOp { op, left, right } => {
            compile_load(emitter, ctx, left)?;
            compile_load(emitter, ctx, right)?;
            match op {
                BinaryOperator::Add => emitter.emit_iadd(),
                BinaryOperator::Sub => emitter.emit_isub(),
                BinaryOperator::Mul => emitter.emit_imul(),
                BinaryOperator::Div => emitter.emit_idiv(),
                BinaryOperator::And => emitter.emit_iand(),
                BinaryOperator::Or => emitter.emit_ior(),
                BinaryOperator::Lth | BinaryOperator::Gte | BinaryOperator::Eq | BinaryOperator::Neq => {
                    let id = ctx.next_label_id();
                    let on_true = format!("True_{}", id);
                    let join = format!("Continue_{}", id);
                    emitter.emit_if_icmp(comparison(*op), &on_true);
                    let depth = emitter.stack_depth();
                    emitter.emit_iconst(0);
                    emitter.emit_goto(&join);
                    emitter.emit_join_label(&on_true, depth);
                    emitter.emit_iconst(1);
                    emitter.emit_join_label(&join, depth + 1);
                }
            }
            Ok(())
        }
        Instruction::UnaryOp {
            op: UnaryOperator::Not,
            operand,
        } => {
            compile_load(emitter, ctx, operand)?;
            let id = ctx.next_label_id();
            let on_true = format!("True_{}", id);
            let join = format!("Continue_{}", id);
            emitter.emit_ifne(&on_true);
            let depth = emitter.stack_depth();
            emitter.emit_iconst(1);
            emitter.emit_goto(&join);
            emitter.emit_join_label(&on_true, depth);
            emitter.emit_iconst(0);
            emitter.emit_join_label(&join, depth + 1);
            Ok(())
        }
        Instruction::Call(call) => compile_call(emitter, ctx, call),
        Instruction::GetField { object, field } => {
            compile_load(emitter, ctx, object)?;
            let owner = ctx.owner(object.ty().name());
            emitter.emit_getfield(&owner, &field.name, &ctx.descriptor(&field.ty)?);
            Ok(())
        }
        Instruction::Assign { .. }
        | Instruction::PutField { .. }
        | Instruction::Goto { .. }
        | Instruction::CondBranch { .. }
        | Instruction::Return { .. } => Err(CodegenError::Unsupported(format!(
            "{} used as a value",
            instruction_name(instruction)
        ))),
    }
}

fn compile_branch(
    emitter: &mut Emitter,
    ctx: &mut CompileContext,
    condition: &Instruction,
    label: &str,
) -> Result<(), CodegenError> {
    match condition {
        Instruction::BinaryOp {
            op: BinaryOperator::And,
            left,
            right,
        } => {
            let skip = format!("Condition_{}", ctx.next_label_id());
            compile_load(emitter, ctx, left)?;
            emitter.emit_ifeq(&skip);
            compile_load(emitter, ctx, right)?;
            emitter.emit_ifeq(&skip);
            emitter.emit_goto(label);
            emitter.emit_join_label(&skip, 0);
        }
        Instruction::BinaryOp {
            op: BinaryOperator::Or,
            left,
            right,
        } => {
            compile_load(emitter, ctx, left)?;
            emitter.emit_ifne(label);
            compile_load(emitter, ctx, right)?;
            emitter.emit_ifne(label);
        }
        Instruction::BinaryOp {
            op: op @ (BinaryOperator::Lth | BinaryOperator::Gte | BinaryOperator::Eq | BinaryOperator::Neq),
            left,
            right,
        } => {
            compile_load(emitter, ctx, left)?;
            compile_load(emitter, ctx, right)?;
            emitter.emit_if_icmp(comparison(*op), label);
        }
        Instruction::UnaryOp {
            op: UnaryOperator::Not,
            operand,
        } => {
            compile_load(emitter, ctx, operand)?;
            emitter.emit_ifeq(label);
        }
        other => {
            compile_value(emitter, ctx, other)?;
            emitter.emit_ifne(label);
        }
    }
    Ok(())
}

fn compile_call(emitter: &mut Emitter, ctx: &mut CompileContext, call: &Call) -> Result<(), CodegenError> {
    match call.kind {
        CallKind::Virtual => {
            compile_load(emitter, ctx, &call.target)?;
            compile_args(emitter, ctx, &call.args)?;
            let owner = ctx.owner(call.target.ty().name());
            invoke(emitter, ctx, Invoke::Virtual, &owner, call)
        }
        CallKind::Static => {
            compile_args(emitter, ctx, &call.args)?;
            let owner = match &call.target {
                Element::Variable(variable) => ctx.owner(&variable.name),
                other => ctx.owner(other.ty().name()),
            };
            invoke(emitter, ctx, Invoke::Static, &owner, call)
        }
        CallKind::Special => {
            compile_load(emitter, ctx, &call.target)?;
            compile_args(emitter, ctx, &call.args)?;
            let is_this = call.target.as_variable().map(Variable::is_this).unwrap_or(false);
            let owner = if is_this && ctx.is_constructor {
                ctx.super_owner()
            } else {
                ctx.owner(call.target.ty().name())
            };
            invoke(emitter, ctx, Invoke::Special, &owner, call)
        }
        CallKind::New => {
            if call.return_type.is_array() {
                let size = call
                    .args
                    .first()
                    .ok_or_else(|| CodegenError::Unsupported("array allocation without a size".to_string()))?;
                compile_load(emitter, ctx, size)?;
                emitter.emit_newarray_int();
            } else {
                let owner = ctx.owner(call.target.ty().name());
                emitter.emit_new(&owner);
            }
            Ok(())
        }
        CallKind::ArrayLength => {
            compile_load(emitter, ctx, &call.target)?;
            emitter.emit_arraylength();
            Ok(())
        }
        CallKind::LoadConst => match &call.target {
            Element::Literal { value, .. } => {
                emitter.emit_ldc(*value);
                Ok(())
            }
            other => compile_load(emitter, ctx, other),
        },
    }
}

fn compile_args(emitter: &mut Emitter, ctx: &mut CompileContext, args: &[Element]) -> Result<(), CodegenError> {
    for arg in args {
        compile_load(emitter, ctx, arg)?;
    }
    Ok(())
}

fn invoke(
    emitter: &mut Emitter,
    ctx: &CompileContext,
    kind: Invoke,
    owner: &str,
    call: &Call,
) -> Result<(), CodegenError> {
    let name = call
        .method
        .as_deref()
        .ok_or_else(|| CodegenError::Unsupported("invocation without a method name".to_string()))?;
    let params = ctx.parameter_descriptors(call)?;
    let ret = ctx.descriptor(&call.return_type)?;
    emitter.emit_invoke(kind, owner, name, &params, &ret);
    Ok(())
}

fn compile_load(emitter: &mut Emitter, ctx: &CompileContext, element: &Element) -> Result<(), CodegenError> {
    match element {
        Element::Literal { value, .. } => {
            emitter.emit_iconst(*value);
            Ok(())
        }
        Element::Variable(variable) => compile_load_variable(emitter, ctx, variable),
        Element::ArrayElement { array, index, ty } => {
            if ty.is_invalid() {
                return Err(CodegenError::InvalidType(format!("{}[]", array.name)));
            }
            compile_load_variable(emitter, ctx, array)?;
            compile_load(emitter, ctx, index)?;
            emitter.emit_iaload();
            Ok(())
        }
    }
}

fn compile_load_variable(emitter: &mut Emitter, ctx: &CompileContext, variable: &Variable) -> Result<(), CodegenError> {
    if variable.ty.is_invalid() || variable.ty.is_void() {
        return Err(CodegenError::InvalidType(variable.name.clone()));
    }
    if variable.is_this() {
        emitter.emit_aload(0);
        return Ok(());
    }
    let slot = ctx.slot(&variable.name)?;
    if variable.ty.is_int_like() {
        emitter.emit_iload(slot);
    } else {
        emitter.emit_aload(slot);
    }
    Ok(())
}

fn compile_store(emitter: &mut Emitter, ctx: &CompileContext, variable: &Variable) -> Result<(), CodegenError> {
    if variable.ty.is_invalid() || variable.ty.is_void() {
        return Err(CodegenError::InvalidType(variable.name.clone()));
    }
    let slot = ctx.slot(&variable.name)?;
    if variable.ty.is_int_like() {
        emitter.emit_istore(slot);
    } else {
        emitter.emit_astore(slot);
    }
    Ok(())
}

fn comparison(op: BinaryOperator) -> Comparison {
    match op {
        BinaryOperator::Lth => Comparison::Lt,
        BinaryOperator::Gte => Comparison::Ge,
        BinaryOperator::Neq => Comparison::Ne,
        _ => Comparison::Eq,
    }
}

fn instruction_name(instruction: &Instruction) -> &'static str {
    match instruction {
        Instruction::Assign { .. } => "assignment",
        Instruction::BinaryOp { .. } => "binary operation",
        Instruction::UnaryOp { .. } => "unary operation",
        Instruction::Call(_) => "call",
        Instruction::GetField { .. } => "getfield",
        Instruction::PutField { .. } => "putfield",
        Instruction::Goto { .. } => "goto",
        Instruction::CondBranch { .. } => "conditional branch",
        Instruction::Return { .. } => "return",
        Instruction::NoOp { .. } => "operand",
    }
}
