//! Provides configuration of a logger for a program that drives the
//! pipeline. The library itself only writes through the `log` facade.
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use env_logger::Builder;
use log::{trace, LevelFilter};
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::CompilerConfig;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Verbosity {0} is higher than the maximum of 4")]
    VerbosityTooHigh(u8),
    #[error("Unable to create log file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("A logger is already installed")]
    AlreadyInstalled,
}

/// The verbosity that the configuration asks for: stage summaries in
/// debug mode, otherwise only warnings.
pub fn verbosity(config: &CompilerConfig) -> u8 {
    if config.debug {
        3
    } else {
        1
    }
}

/// Installs the global logger with the specified verbosity.
///
/// Higher verbosity results in additional log messages up to a maximum
/// verbosity level. Messages go to standard error unless a log file is
/// given.
pub fn configure(verbosity: u8, log_file: Option<PathBuf>) -> Result<(), LoggerError> {
    let log_level = match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        4 => LevelFilter::Trace,
        _ => return Err(LoggerError::VerbosityTooHigh(verbosity)),
    };

    let mut builder = Builder::new();

    if let Some(path) = log_file {
        let file = File::create(&path).map_err(|source| LoggerError::CreateFile {
            path: path.clone(),
            source,
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {:?}] {}",
                record.level(),
                record.target(),
                OffsetDateTime::now_utc(),
                record.args()
            )
        })
        .filter_level(log_level)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInstalled)?;

    trace!("Logger verbosity {log_level}");
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::config::CompilerConfig;
    use crate::logger::{configure, verbosity, LoggerError};

    #[test]
    fn configure_when_verbosity_is_5_then_return_err() {
        let result = configure(5, None);

        assert!(matches!(result, Err(LoggerError::VerbosityTooHigh(5))));
    }

    #[test]
    fn configure_when_log_file_in_missing_directory_then_return_err() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("jmmc.log");

        let result = configure(2, Some(path));

        assert!(matches!(result, Err(LoggerError::CreateFile { .. })));
    }

    #[test]
    fn configure_when_test_logger_installed_then_creates_file_and_return_err() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jmmc.log");

        let result = configure(2, Some(path.clone()));

        assert!(matches!(result, Err(LoggerError::AlreadyInstalled)));
        assert!(path.exists());
    }

    #[test]
    fn verbosity_when_debug_then_debug_level() {
        let config = CompilerConfig {
            debug: true,
            ..Default::default()
        };

        assert_eq!(verbosity(&config), 3);
        assert_eq!(verbosity(&CompilerConfig::default()), 1);
    }
}
