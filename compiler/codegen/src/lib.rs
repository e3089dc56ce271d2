#![allow(clippy::result_large_err)]
//! Code generation for the Java-- compiler.
//!
//! This crate transforms the three-address IR of one class into Jasmin
//! assembly text, which the Jasmin assembler turns into a class file.
//!
//! # Example
//!
//! ```ignore
//! use jmmc_codegen::compile;
//!
//! let output = compile(&program)?;
//! std::fs::write(format!("{}.j", output.class_name), output.code)?;
//! ```

mod compile;
mod emit;
mod error;

pub use compile::{compile, JasminOutput};
pub use error::CodegenError;

#[cfg(test)]
#[ctor::ctor]
fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
