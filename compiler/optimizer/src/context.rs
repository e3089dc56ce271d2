//! Per-method state of the lowering.
use indexmap::IndexMap;
use jmmc_analyzer::symbol_table::Method;
use jmmc_dsl::{
    ir::{Element, Instruction, Variable},
    types::Type,
};

/// Collects the instructions and labels of one method.
///
/// Temporaries and labels share one counter so that a name never repeats
/// inside a method. A new context starts at zero.
pub(crate) struct MethodContext {
    pub method: Method,
    counter: usize,
    instructions: Vec<Instruction>,
    labels: IndexMap<String, usize>,
}

impl MethodContext {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            counter: 0,
            instructions: vec![],
            labels: IndexMap::new(),
        }
    }

    fn next(&mut self) -> usize {
        let value = self.counter;
        self.counter += 1;
        value
    }

    /// Allocates a fresh temporary of the type.
    pub fn temp(&mut self, ty: Type) -> Variable {
        Variable::new(format!("tmp{}", self.next()), ty)
    }

    /// Allocates a fresh label name such as `Then3`.
    pub fn label(&mut self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next())
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Places the label before the next instruction that is pushed.
    pub fn mark(&mut self, label: String) {
        self.labels.insert(label, self.instructions.len());
    }

    /// Assigns the instruction to a fresh temporary and returns the
    /// temporary.
    pub fn assign_temp(&mut self, ty: Type, rhs: Instruction) -> Variable {
        let dest = self.temp(ty);
        self.push(Instruction::Assign {
            dest: Element::Variable(dest.clone()),
            rhs: Box::new(rhs),
        });
        dest
    }

    pub fn finish(self) -> (Vec<Instruction>, IndexMap<String, usize>) {
        (self.instructions, self.labels)
    }
}

#[cfg(test)]
mod tests {
    use jmmc_dsl::types::Type;
    use proptest::prelude::*;

    use super::*;

    fn context() -> MethodContext {
        MethodContext::new(Method::new("foo", Type::void(), vec![], false))
    }

    #[test]
    fn label_when_after_temp_then_shares_counter() {
        let mut ctx = context();
        let temp = ctx.temp(Type::int());
        let label = ctx.label("Then");

        assert_eq!(temp.name, "tmp0");
        assert_eq!(label, "Then1");
    }

    #[test]
    fn mark_when_no_instruction_follows_then_points_past_end() {
        let mut ctx = context();
        ctx.push(Instruction::Return { value: None });
        ctx.mark("End0".to_string());

        let (instructions, labels) = ctx.finish();
        assert_eq!(labels["End0"], instructions.len());
    }

    proptest! {
        #[test]
        fn temp_when_allocated_repeatedly_then_numbered_in_order(count in 1usize..64) {
            let mut ctx = context();
            for expected in 0..count {
                let temp = ctx.temp(Type::int());
                prop_assert_eq!(temp.name, format!("tmp{}", expected));
            }
        }
    }
}
