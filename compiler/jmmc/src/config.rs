//! Options of one compilation.
//!
//! The options arrive as a string map, the way a launcher collects them
//! from the command line. Unknown keys are ignored.
use std::collections::HashMap;

use jmmc_analyzer::type_resolution::MemberPolicy;
use jmmc_optimizer::GeneratorOptions;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Option {key} expects true or false but was '{value}'")]
    NotBoolean { key: String, value: String },
    #[error("Option {key} expects an integer but was '{value}'")]
    NotInteger { key: String, value: String },
    #[error("Option memberPolicy expects permissive or strict but was '{0}'")]
    UnknownMemberPolicy(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Name of the source file. Only used in log messages.
    pub input_file: Option<String>,
    /// Branch directly on conditions instead of evaluating them into a
    /// temporary first.
    pub optimize: bool,
    /// Requested number of registers. Accepted but not used: locals always
    /// get one slot each.
    pub register_allocation: i32,
    /// Logs the IR text of every compilation.
    pub debug: bool,
    /// Spaces per nesting level of the IR text.
    pub indent_width: usize,
    pub member_policy: MemberPolicy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            input_file: None,
            optimize: false,
            register_allocation: -1,
            debug: false,
            indent_width: 4,
            member_policy: MemberPolicy::default(),
        }
    }
}

impl CompilerConfig {
    /// Builds the configuration from the string options. Missing options
    /// keep their default value.
    pub fn from_map(options: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = options.get("inputFile") {
            config.input_file = Some(value.clone());
        }
        if let Some(value) = options.get("optimize") {
            config.optimize = parse_bool("optimize", value)?;
        }
        if let Some(value) = options.get("registerAllocation") {
            config.register_allocation = parse_int("registerAllocation", value)?;
        }
        if let Some(value) = options.get("debug") {
            config.debug = parse_bool("debug", value)?;
        }
        if let Some(value) = options.get("indent") {
            config.indent_width = parse_int("indent", value)?;
        }
        if let Some(value) = options.get("memberPolicy") {
            config.member_policy = match value.trim() {
                "permissive" => MemberPolicy::Permissive,
                "strict" => MemberPolicy::Strict,
                _ => return Err(ConfigError::UnknownMemberPolicy(value.clone())),
            };
        }
        Ok(config)
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            optimize: self.optimize,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotBoolean {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}
