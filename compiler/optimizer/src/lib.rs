//! IR generation for Java--.
//!
//! This crate lowers a syntax tree that passed semantic analysis into the
//! three-address [`Program`](jmmc_dsl::ir::Program) that the code generator
//! consumes.
//!
//! # Example
//!
//! ```ignore
//! use jmmc_analyzer::stages::analyze;
//! use jmmc_optimizer::{generate, GeneratorOptions};
//!
//! let output = analyze(&mut tree, MemberPolicy::default())?;
//! let program = generate(&tree, &output.value, &GeneratorOptions::default()).value;
//! println!("{}", program);
//! ```

mod context;
mod expression;
mod generator;

pub use generator::{generate, GeneratorOptions};

#[cfg(test)]
#[ctor::ctor]
fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
