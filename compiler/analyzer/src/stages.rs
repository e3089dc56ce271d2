//! The semantic analysis as individual stages (to enable testing).

use jmmc_dsl::{
    diagnostic::{Diagnostic, StageOutput},
    syntax::SyntaxTree,
};
use log::debug;

use crate::{
    symbol_table::ClassTable, symbol_table_builder, type_checker, type_resolution::MemberPolicy,
};

/// Builds the class table of the program (stage 1).
///
/// The table is always complete. Duplicate declarations are reported in the
/// diagnostics and the first declaration is kept.
pub fn build_symbol_table(tree: &SyntaxTree) -> StageOutput<ClassTable> {
    symbol_table_builder::build(tree)
}

/// Type checks the method bodies against the class table (stage 2) and
/// annotates expression nodes with their inferred type.
pub fn type_check(tree: &mut SyntaxTree, table: &ClassTable, policy: MemberPolicy) -> Vec<Diagnostic> {
    type_checker::check(tree, table, policy)
}

/// Analyze runs both semantic stages.
///
/// Returns `Err` with every diagnostic when the symbol table has errors; the
/// type checker does not run in that case. Otherwise returns the class table
/// with the warnings of the symbol table and all diagnostics of the type
/// checker, which may include errors.
pub fn analyze(tree: &mut SyntaxTree, policy: MemberPolicy) -> Result<StageOutput<ClassTable>, Vec<Diagnostic>> {
    let (table, mut diagnostics) = build_symbol_table(tree).into_result()?;
    diagnostics.extend(type_check(tree, &table, policy));
    debug!("Semantic analysis reported {} diagnostics", diagnostics.len());
    Ok(StageOutput::new(table, diagnostics))
}

#[cfg(test)]
mod tests {
    use jmmc_problems::Problem;
    use jmmc_test::{ast::*, read_shared_tree};

    use super::analyze;
    use crate::test_helpers::codes;
    use crate::type_resolution::MemberPolicy;

    #[test]
    fn analyze_when_simple_then_ok() {
        let mut tree = read_shared_tree("simple.json");

        let output = analyze(&mut tree, MemberPolicy::Permissive).unwrap();

        assert!(output.diagnostics.is_empty());
        assert_eq!(output.value.class_name(), Some("Simple"));
    }

    #[test]
    fn analyze_when_loops_then_ok() {
        let mut tree = read_shared_tree("loops.json");

        let output = analyze(&mut tree, MemberPolicy::Permissive).unwrap();

        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        assert!(output.value.field("values").is_some());
    }

    #[test]
    fn analyze_when_duplicate_field_then_type_checker_does_not_run() {
        let mut tree = program(
            &[],
            class(
                "Simple",
                None,
                vec![
                    var_decl("int", "a"),
                    var_decl("int", "a"),
                    main_method(vec![assign("undeclared", int(1))]),
                ],
            ),
        );

        let diagnostics = analyze(&mut tree, MemberPolicy::Permissive).unwrap_err();

        assert_eq!(codes(&diagnostics), vec![Problem::DuplicateField.code()]);
    }

    #[test]
    fn analyze_when_type_error_then_ok_with_error() {
        let mut tree = program(
            &[],
            class(
                "Simple",
                None,
                vec![main_method(vec![assign("undeclared", int(1))])],
            ),
        );

        let output = analyze(&mut tree, MemberPolicy::Permissive).unwrap();

        assert!(output.has_errors());
        assert_eq!(codes(&output.diagnostics), vec![Problem::VariableNotDeclared.code()]);
    }
}
