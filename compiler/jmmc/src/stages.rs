//! The compiler as individual stages (to enable testing).

use jmmc_analyzer::symbol_table::ClassTable;
use jmmc_codegen::{CodegenError, JasminOutput};
use jmmc_dsl::{
    diagnostic::{has_errors, Diagnostic, StageOutput},
    ir::Program,
    syntax::SyntaxTree,
};
use log::debug;
use thiserror::Error;

use crate::config::CompilerConfig;

#[derive(Debug, Error)]
pub enum CompileError {
    /// A stage reported an error. Holds every diagnostic reported up to
    /// and including that stage, warnings included.
    #[error("Compilation stopped with {} diagnostics", .0.len())]
    Diagnostics(Vec<Diagnostic>),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// The artifacts of a successful compilation.
#[derive(Debug)]
pub struct Compilation {
    pub table: ClassTable,
    pub program: Program,
    pub jasmin: JasminOutput,
    /// Warnings of all stages.
    pub diagnostics: Vec<Diagnostic>,
}

/// Analyze runs the symbol table builder and the type checker (stages 1
/// and 2).
///
/// Returns `Err(Vec<Diagnostic>)` if the symbol table has errors.
/// Otherwise returns the class table with the diagnostics of both stages,
/// which may include errors of the type checker.
pub fn analyze(tree: &mut SyntaxTree, config: &CompilerConfig) -> Result<StageOutput<ClassTable>, Vec<Diagnostic>> {
    jmmc_analyzer::stages::analyze(tree, config.member_policy)
}

/// Optimize lowers the analyzed tree to the intermediate representation
/// (stage 3).
pub fn optimize(tree: &SyntaxTree, table: &ClassTable, config: &CompilerConfig) -> StageOutput<Program> {
    let output = jmmc_optimizer::generate(tree, table, &config.generator_options());
    if config.debug {
        debug!("IR\n{}", output.value.render(config.indent_width));
    }
    output
}

/// Emit serializes the intermediate representation as Jasmin assembly
/// (stage 4).
///
/// Returns `Err(CodegenError)` when the program contains a construct that
/// the earlier stages should have rejected.
pub fn emit(program: &Program) -> Result<StageOutput<JasminOutput>, CodegenError> {
    let output = jmmc_codegen::compile(program)?;
    Ok(StageOutput::new(output, vec![]))
}

/// Compile runs all stages and stops after the first stage that reports
/// an error.
pub fn compile(tree: &mut SyntaxTree, config: &CompilerConfig) -> Result<Compilation, CompileError> {
    debug!(
        "Compiling {}",
        config.input_file.as_deref().unwrap_or("<memory>")
    );

    let (table, mut diagnostics) = analyze(tree, config)
        .map_err(CompileError::Diagnostics)?
        .into_result()
        .map_err(CompileError::Diagnostics)?;

    let lowered = optimize(tree, &table, config);
    diagnostics.extend(lowered.diagnostics);
    if has_errors(&diagnostics) {
        return Err(CompileError::Diagnostics(diagnostics));
    }

    let emitted = emit(&lowered.value)?;
    diagnostics.extend(emitted.diagnostics);

    Ok(Compilation {
        table,
        program: lowered.value,
        jasmin: emitted.value,
        diagnostics,
    })
}
