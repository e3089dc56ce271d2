// Allow large errors because this is a compiler - we expect large errors.
#![allow(clippy::result_large_err)]
//! The Java-- compiler as a pipeline of four stages.
//!
//! The stages are the symbol table builder and the type checker (both in
//! `jmmc-analyzer`), the IR generator (`jmmc-optimizer`) and the Jasmin
//! emitter (`jmmc-codegen`). Parsing, file handling and running the
//! assembler belong to the caller.
//!
//! # Example
//!
//! ```ignore
//! use jmmc::{compile, CompilerConfig};
//!
//! let config = CompilerConfig::from_map(&options)?;
//! let mut tree = SyntaxTree::from_json(&json)?;
//! let compilation = compile(&mut tree, &config)?;
//! println!("{}", compilation.jasmin.code);
//! ```

pub mod config;
pub mod logger;
pub mod stages;

pub use config::{CompilerConfig, ConfigError};
pub use stages::{compile, CompileError, Compilation};

#[cfg(test)]
#[ctor::ctor]
fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
