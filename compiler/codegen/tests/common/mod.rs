//! Shared test helpers for codegen integration tests.

use jmmc_analyzer::{stages::analyze, type_resolution::MemberPolicy};
use jmmc_codegen::{compile, JasminOutput};
use jmmc_dsl::syntax::SyntaxTree;
use jmmc_optimizer::{generate, GeneratorOptions};
use jmmc_test::read_shared_tree;

/// Analyzes, lowers and compiles a syntax tree that is expected to be free
/// of errors.
#[allow(dead_code)]
pub fn compile_tree(mut tree: SyntaxTree, optimize: bool) -> JasminOutput {
    let analysis = analyze(&mut tree, MemberPolicy::Permissive).unwrap();
    assert!(!analysis.has_errors(), "{:?}", analysis.diagnostics);
    let program = generate(&tree, &analysis.value, &GeneratorOptions { optimize });
    assert!(!program.has_errors(), "{:?}", program.diagnostics);
    compile(&program.value).unwrap()
}

/// Compiles one of the shared syntax tree fixtures.
#[allow(dead_code)]
pub fn compile_fixture(name: &'static str, optimize: bool) -> JasminOutput {
    compile_tree(read_shared_tree(name), optimize)
}

/// Returns the text of one method from `.method` to `.end method`.
#[allow(dead_code)]
pub fn method_text<'a>(code: &'a str, name: &str) -> &'a str {
    let header = code
        .match_indices(".method ")
        .map(|(start, _)| start)
        .find(|start| {
            code[*start..]
                .lines()
                .next()
                .map(|line| line.contains(&format!(" {}(", name)))
                .unwrap_or(false)
        })
        .unwrap();
    let end = code[header..].find(".end method").unwrap() + header;
    &code[header..end]
}
