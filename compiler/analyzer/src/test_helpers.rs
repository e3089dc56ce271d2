use jmmc_dsl::diagnostic::Diagnostic;
use jmmc_dsl::syntax::SyntaxTree;

use crate::symbol_table::ClassTable;
use crate::symbol_table_builder;
use crate::type_checker;
use crate::type_resolution::MemberPolicy;

/// The problem codes of the diagnostics, in report order.
pub fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics.iter().map(|d| d.code.as_str()).collect()
}

/// Builds the class table and type checks the tree. Returns the table and
/// the diagnostics of both stages.
pub fn check_program(tree: &mut SyntaxTree, policy: MemberPolicy) -> (ClassTable, Vec<Diagnostic>) {
    let output = symbol_table_builder::build(tree);
    let mut diagnostics = output.diagnostics;
    diagnostics.extend(type_checker::check(tree, &output.value, policy));
    (output.value, diagnostics)
}
