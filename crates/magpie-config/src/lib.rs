//! Configuration system for magpie.
//!
//! magpie reads a single TOML file named `magpie.toml`. It is either given
//! explicitly or found by walking up the directory tree from the current
//! working directory. Every section is optional.

#![warn(missing_docs)]

mod discovery;
mod error;
mod parse;
mod resolve;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub use discovery::{CONFIG_FILENAME, discover_config_file};
pub use error::ConfigError;
pub use parse::{
    RawConfig, RawDictionaries, RawIndex, RawSearchSettings, RawSettings, parse_config_file,
    parse_config_str, resolve_config,
};
pub use resolve::resolve_path;
use serde::{Deserialize, Serialize};

/// Top-level resolved configuration for magpie.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Request limits.
    pub settings: Settings,
    /// Search-related settings.
    pub search: SearchSettings,
    /// Rewrite and synonym dictionary locations.
    pub dictionaries: DictionarySettings,
    /// Search index location.
    pub index: IndexSettings,
    /// Directory containing the configuration file, if one was loaded.
    pub config_root: Option<PathBuf>,
}

impl Config {
    /// Loads and validates the configuration file at `path`.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_file(path)?;
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = resolve_config(raw, config_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Finds `magpie.toml` at or above `cwd` and loads it.
    pub fn discover(cwd: &Path) -> Result<Self, ConfigError> {
        let path = discover_config_file(cwd).ok_or_else(|| ConfigError::NotFound {
            filename: CONFIG_FILENAME,
            start: cwd.to_path_buf(),
        })?;
        Self::load_from_file(&path)
    }

    /// Parses configuration from a string, resolving relative paths against `base_dir`.
    pub fn parse_str(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw = parse_config_str(content, &base_dir.join(CONFIG_FILENAME))?;
        let config = resolve_config(raw, base_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that the TOML types alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.max_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "settings.max_limit",
                message: "must be at least 1".into(),
            });
        }
        if self.settings.default_limit > self.settings.max_limit {
            return Err(ConfigError::InvalidValue {
                field: "settings.default_limit",
                message: format!(
                    "{} exceeds settings.max_limit ({})",
                    self.settings.default_limit, self.settings.max_limit
                ),
            });
        }
        if self.search.query_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.query_timeout_ms",
                message: "must be greater than zero".into(),
            });
        }
        if self.search.max_variants == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.max_variants",
                message: "must be at least 1".into(),
            });
        }
        if self.search.max_combinations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search.max_combinations",
                message: "must be at least 1".into(),
            });
        }
        if self.search.candidate_pool < self.settings.max_limit {
            return Err(ConfigError::InvalidValue {
                field: "search.candidate_pool",
                message: format!(
                    "{} is smaller than settings.max_limit ({})",
                    self.search.candidate_pool, self.settings.max_limit
                ),
            });
        }
        Ok(())
    }

    /// Serializes the effective settings to TOML format.
    pub fn settings_to_toml(&self) -> String {
        let serializable = SerializableSettings {
            settings: self.settings.clone(),
            search: self.search.clone(),
        };
        toml::to_string_pretty(&serializable).unwrap_or_default()
    }
}

/// Request limit settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Number of results when the caller gives no limit.
    pub default_limit: usize,
    /// Caller-supplied limits above this are clamped to it.
    pub max_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// Search-related settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Stemming language for the index analyzer.
    pub stemmer: String,
    /// Match single-token variants by prefix (autosuggest behaviour).
    pub prefix_match: bool,
    /// Rows pulled from the index before merging and truncation.
    pub candidate_pool: usize,
    /// Upper bound for a single search, in milliseconds.
    pub query_timeout_ms: u64,
    /// Hard per-token cap on variants produced by synonym expansion.
    pub max_variants: usize,
    /// Cap on the conjunctions a whole search text may expand to.
    pub max_combinations: usize,
    /// Maximum snippet length in characters.
    pub snippet_max_chars: usize,
}

impl SearchSettings {
    /// Combination cap used when none is configured.
    pub const DEFAULT_MAX_COMBINATIONS: usize = 256;

    /// Returns the configured query timeout.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            stemmer: String::from("dutch"),
            prefix_match: true,
            candidate_pool: 500,
            query_timeout_ms: 15_000,
            max_variants: 1024,
            max_combinations: Self::DEFAULT_MAX_COMBINATIONS,
            snippet_max_chars: 150,
        }
    }
}

/// Locations of the rewrite and synonym CSV files.
#[derive(Debug, Clone, Default)]
pub struct DictionarySettings {
    /// Rewrite rules (`canonical,alt1,alt2,...`); `None` means no rewrites.
    pub rewrites: Option<PathBuf>,
    /// Synonym rules (`canonical,alt1,alt2,...`); `None` means no synonyms.
    pub synonyms: Option<PathBuf>,
}

/// Location of the search index.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Directory holding the tantivy index.
    pub path: PathBuf,
}

impl IndexSettings {
    /// Index directory used when none is configured, relative to the config file.
    pub const DEFAULT_DIR: &'static str = "index";
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(Self::DEFAULT_DIR),
        }
    }
}

/// Internal struct for TOML serialization of settings.
#[derive(Serialize)]
struct SerializableSettings {
    /// Request limits.
    settings: Settings,
    /// Search-related settings.
    search: SearchSettings,
}
