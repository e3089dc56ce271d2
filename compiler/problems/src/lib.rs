//! Catalog of the problems (warnings and errors) that the compiler stages
//! report. The enumeration is generated from `resources/problem-codes.csv`.

include!(concat!(env!("OUT_DIR"), "/problems.rs"));

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::Problem;

    #[test]
    fn code_when_any_problem_then_code_is_unique() {
        let mut seen = HashSet::new();
        for problem in Problem::all() {
            assert!(seen.insert(problem.code()), "duplicate {}", problem.code());
        }
    }

    #[test]
    fn code_when_semantic_problem_then_has_stage_prefix() {
        assert_eq!(Problem::VariableNotDeclared.code(), "S0202");
        assert_eq!(Problem::UnresolvedIdentifier.code(), "O0301");
    }

    #[test]
    fn message_when_problem_then_not_empty() {
        for problem in Problem::all() {
            assert!(!problem.message().is_empty());
        }
    }
}
