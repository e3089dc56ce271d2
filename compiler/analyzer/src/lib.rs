// Allow large errors because this is a compiler - we expect large errors.
#![allow(clippy::result_large_err)]

extern crate jmmc_dsl;

pub mod stages;
pub mod symbol_table;
pub mod symbol_table_builder;
mod type_checker;
pub mod type_resolution;

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
#[ctor::ctor]
fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
