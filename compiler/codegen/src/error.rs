//! Error types for code generation.
//!
//! These are internal faults: the analysis stages should have rejected the
//! program before it reached the emitter.

use thiserror::Error;

/// Errors that can occur during code generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// A variable was referenced but has no local slot.
    #[error("undeclared variable: {0}")]
    UndeclaredVariable(String),
    /// An instruction or element kind that the emitter does not lower.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// A value whose type failed to type check.
    #[error("invalid type: {0}")]
    InvalidType(String),
}
