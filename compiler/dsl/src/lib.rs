//! Provides the objects shared by every stage of the Java-- compiler: the
//! syntax tree handed over by the parser, the type model, diagnostics and the
//! three-address intermediate representation.

pub mod core;
pub mod diagnostic;
pub mod ir;
pub mod syntax;
pub mod types;
