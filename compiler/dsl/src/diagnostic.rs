//! Provides definition for diagnostics, which are the errors and warnings
//! that the compiler stages report about a Java-- program.
//!
//! Stages never stop at the first problem. Each stage returns its payload
//! together with every diagnostic it found and the caller decides whether to
//! continue with the next stage.

use core::fmt;

use jmmc_problems::Problem;

use crate::core::SourcePosition;

/// How serious a diagnostic is. Any `Error` stops the pipeline after the
/// stage that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// The compiler stage that reported a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Symbol table construction and type checking.
    Semantic,
    /// Lowering to the intermediate representation.
    Optimization,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Semantic => write!(f, "SEMANTIC"),
            Stage::Optimization => write!(f, "OPTIMIZATION"),
        }
    }
}

/// A label that refers to a position in the source and is associated with
/// a message related to that position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// The position of label.
    pub position: SourcePosition,

    /// A message describing this label.
    pub message: String,
}

impl Label {
    pub fn at(position: SourcePosition, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    /// A label that is not related to a particular line of the source.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::at(SourcePosition::default(), message)
    }
}

/// A diagnostic. Diagnostic have a code that is indicative of the category,
/// a primary location and possibly non-zero set of secondary location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// A normally unique value describing the type of diagnostic.
    pub code: String,

    description: String,

    pub severity: Severity,

    pub stage: Stage,

    /// The primary or first diagnostic.
    pub primary: Label,

    /// Additional descriptions to the constant description.
    pub described: Vec<String>,

    /// Additional information about the diagnostic.
    pub secondary: Vec<Label>,
}

impl Diagnostic {
    /// Creates an error diagnostic in the semantic stage from the problem
    /// code and with the specified label.
    pub fn problem(problem: Problem, primary: Label) -> Self {
        Self {
            code: problem.code().to_string(),
            description: problem.message().to_string(),
            severity: Severity::Error,
            stage: Stage::Semantic,
            primary,
            described: vec![],
            secondary: vec![],
        }
    }

    /// Creates a "todo" diagnostic associated with a file and line in the Rust
    /// source code.
    ///
    /// Unlike other uses of problem, the location in this is related to the compiler
    /// rather than the Java-- source.
    pub fn todo(file: &str, line: u32) -> Self {
        Diagnostic::problem(
            Problem::NotImplemented,
            Label::unknown(format!("Not implemented at {}#L{}", file, line)),
        )
    }

    /// Changes the diagnostic into a warning.
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Adds to the problem description (primary text) additional context
    /// about the problem.
    ///
    /// This is similar to adding primary and second items except that this
    /// forms part of the main description and does not need to be related to
    /// a position in a source file.
    pub fn with_context(mut self, description: &str, item: &str) -> Self {
        self.described.push(format!("{}={}", description, item));
        self
    }

    pub fn with_secondary(mut self, label: Label) -> Self {
        self.secondary.push(label);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn line(&self) -> u32 {
        self.primary.position.line
    }

    pub fn column(&self) -> u32 {
        self.primary.position.column
    }

    /// Returns the description for the diagnostic. This may add in other
    /// data in addition that is part of the diagnostic.
    pub fn description(&self) -> String {
        if self.described.is_empty() {
            self.description.clone()
        } else {
            format!("{} ({})", self.description, self.described.join(", "))
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {}: {}",
            self.severity,
            self.stage,
            self.code,
            self.primary.position,
            self.description()
        )
    }
}

/// Returns true if any of the diagnostics is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// What a stage produced together with every diagnostic it reported.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> StageOutput<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }

    /// Returns the value and the warnings when there is no error, otherwise
    /// all diagnostics.
    pub fn into_result(self) -> Result<(T, Vec<Diagnostic>), Vec<Diagnostic>> {
        if has_errors(&self.diagnostics) {
            Err(self.diagnostics)
        } else {
            Ok((self.value, self.diagnostics))
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn description_when_has_context_then_appends_context() {
        let diagnostic = Diagnostic::problem(
            Problem::VariableNotDeclared,
            Label::at(SourcePosition::new(3, 7), "Identifier"),
        )
        .with_context("name", "x");

        assert_eq!(
            diagnostic.description(),
            format!("{} (name=x)", Problem::VariableNotDeclared.message())
        );
        assert_eq!(diagnostic.line(), 3);
        assert_eq!(diagnostic.column(), 7);
    }

    #[test]
    fn warning_when_applied_then_not_error() {
        let diagnostic =
            Diagnostic::problem(Problem::DuplicateImport, Label::unknown("Import")).warning();
        assert!(!diagnostic.is_error());
        assert!(!has_errors(&[diagnostic]));
    }

    #[test]
    fn into_result_when_only_warnings_then_ok() {
        let output = StageOutput::new(
            1,
            vec![Diagnostic::problem(Problem::DuplicateImport, Label::unknown("Import")).warning()],
        );
        let (value, warnings) = output.into_result().unwrap();
        assert_eq!(value, 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn into_result_when_error_then_err() {
        let output = StageOutput::new(
            (),
            vec![Diagnostic::problem(Problem::DuplicateField, Label::unknown("Field"))],
        );
        assert!(output.has_errors());
        assert_eq!(output.into_result().unwrap_err().len(), 1);
    }

    #[test]
    fn display_when_optimization_stage_then_names_stage() {
        let diagnostic =
            Diagnostic::problem(Problem::UnresolvedIdentifier, Label::unknown("Identifier"))
                .with_stage(Stage::Optimization);
        let text = diagnostic.to_string();
        assert!(text.starts_with("ERROR OPTIMIZATION [O0301] 0:0"));
    }

    proptest! {
        #[test]
        fn into_result_when_any_error_then_err_with_all_diagnostics(errors in proptest::collection::vec(any::<bool>(), 0..16)) {
            let diagnostics: Vec<Diagnostic> = errors
                .iter()
                .map(|is_error| {
                    let diagnostic = Diagnostic::problem(Problem::DuplicateImport, Label::unknown("Import"));
                    if *is_error { diagnostic } else { diagnostic.warning() }
                })
                .collect();

            let result = StageOutput::new((), diagnostics).into_result();

            match result {
                Ok((_, warnings)) => {
                    prop_assert!(!errors.contains(&true));
                    prop_assert_eq!(warnings.len(), errors.len());
                }
                Err(all) => {
                    prop_assert!(errors.contains(&true));
                    prop_assert_eq!(all.len(), errors.len());
                }
            }
        }
    }
}
