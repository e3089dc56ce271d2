//! Low-level Jasmin emitter.
//!
//! Provides a builder that appends one mnemonic per line to a text buffer
//! and keeps track of the operand stack depth so that the caller can write
//! the `.limit stack` directive.

use core::fmt;

/// The integer comparison of an `if_icmp<cond>` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    fn suffix(&self) -> &'static str {
        match self {
            Comparison::Lt => "lt",
            Comparison::Ge => "ge",
            Comparison::Eq => "eq",
            Comparison::Ne => "ne",
        }
    }
}

/// The dispatch of a method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invoke {
    Virtual,
    Special,
    Static,
}

impl Invoke {
    fn mnemonic(&self) -> &'static str {
        match self {
            Invoke::Virtual => "invokevirtual",
            Invoke::Special => "invokespecial",
            Invoke::Static => "invokestatic",
        }
    }

    /// Number of receivers the invocation pops in addition to the arguments.
    fn receivers(&self) -> u16 {
        match self {
            Invoke::Static => 0,
            Invoke::Virtual | Invoke::Special => 1,
        }
    }
}

/// Accumulates Jasmin instructions for one method body.
pub struct Emitter {
    code: String,
    max_stack_depth: u16,
    current_stack_depth: u16,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            code: String::new(),
            max_stack_depth: 0,
            current_stack_depth: 0,
        }
    }

    /// Emits the cheapest instruction that pushes the integer constant:
    /// `iconst_m1`, `iconst_<n>`, `bipush`, `sipush` and finally `ldc`.
    pub fn emit_iconst(&mut self, value: i32) {
        match value {
            -1 => self.op("iconst_m1"),
            0..=5 => self.op(format_args!("iconst_{}", value)),
            -128..=127 => self.op(format_args!("bipush {}", value)),
            -32768..=32767 => self.op(format_args!("sipush {}", value)),
            _ => self.op(format_args!("ldc {}", value)),
        }
        self.push_stack(1);
    }

    /// Emits `ldc` regardless of the size of the value.
    pub fn emit_ldc(&mut self, value: i32) {
        self.op(format_args!("ldc {}", value));
        self.push_stack(1);
    }

    /// Emits ILOAD for an int or boolean local.
    pub fn emit_iload(&mut self, slot: u16) {
        self.slot_op("iload", slot);
        self.push_stack(1);
    }

    /// Emits ALOAD for a reference local.
    pub fn emit_aload(&mut self, slot: u16) {
        self.slot_op("aload", slot);
        self.push_stack(1);
    }

    /// Emits ISTORE for an int or boolean local.
    pub fn emit_istore(&mut self, slot: u16) {
        self.slot_op("istore", slot);
        self.pop_stack(1);
    }

    /// Emits ASTORE for a reference local.
    pub fn emit_astore(&mut self, slot: u16) {
        self.slot_op("astore", slot);
        self.pop_stack(1);
    }

    /// Emits IALOAD (pops array and index, pushes the element).
    pub fn emit_iaload(&mut self) {
        self.op("iaload");
        self.pop_stack(1);
    }

    /// Emits IASTORE (pops array, index and value).
    pub fn emit_iastore(&mut self) {
        self.op("iastore");
        self.pop_stack(3);
    }

    /// Emits IINC, which does not touch the stack.
    pub fn emit_iinc(&mut self, slot: u16, value: i32) {
        self.op(format_args!("iinc {} {}", slot, value));
    }

    pub fn emit_iadd(&mut self) {
        self.binary("iadd");
    }

    pub fn emit_isub(&mut self) {
        self.binary("isub");
    }

    pub fn emit_imul(&mut self) {
        self.binary("imul");
    }

    pub fn emit_idiv(&mut self) {
        self.binary("idiv");
    }

    pub fn emit_iand(&mut self) {
        self.binary("iand");
    }

    pub fn emit_ior(&mut self) {
        self.binary("ior");
    }

    /// Emits IF_ICMP<cond> (pops two).
    pub fn emit_if_icmp(&mut self, comparison: Comparison, label: &str) {
        self.op(format_args!("if_icmp{} {}", comparison.suffix(), label));
        self.pop_stack(2);
    }

    /// Emits IFEQ (pops one).
    pub fn emit_ifeq(&mut self, label: &str) {
        self.op(format_args!("ifeq {}", label));
        self.pop_stack(1);
    }

    /// Emits IFNE (pops one).
    pub fn emit_ifne(&mut self, label: &str) {
        self.op(format_args!("ifne {}", label));
        self.pop_stack(1);
    }

    pub fn emit_goto(&mut self, label: &str) {
        self.op(format_args!("goto {}", label));
    }

    /// Binds a label of the instruction list. The stack is empty at the
    /// start of every IR instruction.
    pub fn emit_label(&mut self, label: &str) {
        self.code.push_str(&format!("{}:\n", label));
        self.current_stack_depth = 0;
    }

    /// Binds a label inside the expansion of one instruction, where the
    /// stack holds `depth` values at the join point.
    pub fn emit_join_label(&mut self, label: &str, depth: u16) {
        self.code.push_str(&format!("{}:\n", label));
        self.current_stack_depth = depth;
    }

    /// Emits NEW for the class (pushes the uninitialized reference).
    pub fn emit_new(&mut self, owner: &str) {
        self.op(format_args!("new {}", owner));
        self.push_stack(1);
    }

    pub fn emit_dup(&mut self) {
        self.op("dup");
        self.push_stack(1);
    }

    pub fn emit_pop(&mut self) {
        self.op("pop");
        self.pop_stack(1);
    }

    /// Emits NEWARRAY int (pops the size, pushes the array).
    pub fn emit_newarray_int(&mut self) {
        self.op("newarray int");
    }

    /// Emits ARRAYLENGTH (pops the array, pushes the length).
    pub fn emit_arraylength(&mut self) {
        self.op("arraylength");
    }

    /// Emits an invocation of `owner/name(params)ret`.
    ///
    /// Pops the receiver (except for static calls) and one value per
    /// parameter, then pushes the result unless the return descriptor is
    /// `V`.
    pub fn emit_invoke(&mut self, invoke: Invoke, owner: &str, name: &str, params: &[String], ret: &str) {
        self.op(format_args!(
            "{} {}/{}({}){}",
            invoke.mnemonic(),
            owner,
            name,
            params.concat(),
            ret
        ));
        self.pop_stack(invoke.receivers() + params.len() as u16);
        if ret != "V" {
            self.push_stack(1);
        }
    }

    /// Emits GETFIELD (pops the object, pushes the value).
    pub fn emit_getfield(&mut self, owner: &str, name: &str, descriptor: &str) {
        self.op(format_args!("getfield {}/{} {}", owner, name, descriptor));
    }

    /// Emits PUTFIELD (pops the object and the value).
    pub fn emit_putfield(&mut self, owner: &str, name: &str, descriptor: &str) {
        self.op(format_args!("putfield {}/{} {}", owner, name, descriptor));
        self.pop_stack(2);
    }

    pub fn emit_ireturn(&mut self) {
        self.op("ireturn");
        self.pop_stack(1);
    }

    pub fn emit_areturn(&mut self) {
        self.op("areturn");
        self.pop_stack(1);
    }

    pub fn emit_return(&mut self) {
        self.op("return");
    }

    /// Returns the emitted text.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns true when the last emitted line is a return instruction.
    pub fn ends_with_return(&self) -> bool {
        self.code
            .lines()
            .last()
            .map(|line| matches!(line.trim(), "return" | "ireturn" | "areturn"))
            .unwrap_or(false)
    }

    /// Returns the maximum stack depth reached during emission.
    pub fn max_stack_depth(&self) -> u16 {
        self.max_stack_depth
    }

    /// Returns the current stack depth.
    pub fn stack_depth(&self) -> u16 {
        self.current_stack_depth
    }

    /// Forgets the values on the stack at the start of an IR instruction.
    /// The maximum is kept.
    pub fn reset_stack_depth(&mut self) {
        self.current_stack_depth = 0;
    }

    fn op(&mut self, text: impl fmt::Display) {
        self.code.push_str(&format!("\t{}\n", text));
    }

    /// Slots 0 to 3 have a dedicated single byte form.
    fn slot_op(&mut self, mnemonic: &str, slot: u16) {
        if slot <= 3 {
            self.op(format_args!("{}_{}", mnemonic, slot));
        } else {
            self.op(format_args!("{} {}", mnemonic, slot));
        }
    }

    fn binary(&mut self, mnemonic: &str) {
        self.op(mnemonic);
        // Net effect: pop 2, push 1 = pop 1
        self.pop_stack(1);
    }

    fn push_stack(&mut self, count: u16) {
        self.current_stack_depth += count;
        if self.current_stack_depth > self.max_stack_depth {
            self.max_stack_depth = self.current_stack_depth;
        }
    }

    fn pop_stack(&mut self, count: u16) {
        self.current_stack_depth = self.current_stack_depth.saturating_sub(count);
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
