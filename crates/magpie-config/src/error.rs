//! Error types for magpie configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading configuration or search dictionaries.
///
/// Every variant is fatal at startup: the service never runs with a partially
/// loaded configuration or dictionary.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// No configuration file was found during discovery.
    #[error("no {filename} found in {start} or any parent directory")]
    NotFound {
        /// Name of the file that was searched for.
        filename: &'static str,
        /// Directory the search started from.
        start: PathBuf,
    },

    /// Failed to open a rewrite or synonym dictionary.
    #[error("failed to open dictionary {path}: {source}")]
    ReadDictionary {
        /// Path to the dictionary file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A dictionary file is malformed.
    #[error("failed to parse dictionary {path} at line {line}: {message}")]
    ParseDictionary {
        /// Path to the dictionary file.
        path: PathBuf,
        /// 1-based line number of the offending record (0 when unknown).
        line: u64,
        /// Description of the problem.
        message: String,
    },

    /// A synonym dictionary generates more variants for a single token than allowed.
    #[error("synonym dictionary expands '{token}' into more than {limit} variants")]
    ExpansionLimit {
        /// Dictionary entry that hit the cap.
        token: String,
        /// The configured per-token variant cap.
        limit: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// Dotted name of the offending setting.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}
