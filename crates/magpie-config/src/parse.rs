//! Configuration file parsing.
//!
//! Parses a `magpie.toml` file into a `RawConfig` that preserves the optional
//! nature of every field, then resolves it against defaults.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    Config, ConfigError, DictionarySettings, IndexSettings, SearchSettings, Settings,
    resolve::resolve_path,
};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    /// General settings section.
    pub settings: Option<RawSettings>,
    /// Search settings section.
    pub search: Option<RawSearchSettings>,
    /// Dictionary file locations.
    pub dictionaries: Option<RawDictionaries>,
    /// Search index location.
    pub index: Option<RawIndex>,
}

/// Raw general settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    /// Number of results when the caller gives no limit.
    pub default_limit: Option<usize>,
    /// Upper bound applied to caller-supplied limits.
    pub max_limit: Option<usize>,
}

/// Raw search settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSearchSettings {
    /// Stemming language used by the index analyzer.
    pub stemmer: Option<String>,
    /// Whether single-token variants match by prefix.
    pub prefix_match: Option<bool>,
    /// Rows pulled from the index before merging.
    pub candidate_pool: Option<usize>,
    /// Query timeout in milliseconds.
    pub query_timeout_ms: Option<u64>,
    /// Hard per-token cap on generated variants.
    pub max_variants: Option<usize>,
    /// Cap on conjunctions per search text.
    pub max_combinations: Option<usize>,
    /// Maximum snippet length in characters.
    pub snippet_max_chars: Option<usize>,
}

/// Raw dictionary locations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawDictionaries {
    /// Path to the rewrite rules CSV.
    pub rewrites: Option<String>,
    /// Path to the synonym rules CSV.
    pub synonyms: Option<String>,
}

/// Raw index location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawIndex {
    /// Directory holding the search index.
    pub path: Option<String>,
}

/// Parses a TOML string into a raw configuration.
pub fn parse_config_str(content: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses a configuration file.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&content, path)
}

/// Resolves a raw configuration into a complete [`Config`].
///
/// Relative paths are resolved against `config_dir`.
pub fn resolve_config(raw: RawConfig, config_dir: &Path) -> Result<Config, ConfigError> {
    let settings_defaults = Settings::default();
    let raw_settings = raw.settings.unwrap_or_default();
    let settings = Settings {
        default_limit: raw_settings
            .default_limit
            .unwrap_or(settings_defaults.default_limit),
        max_limit: raw_settings.max_limit.unwrap_or(settings_defaults.max_limit),
    };

    let search_defaults = SearchSettings::default();
    let raw_search = raw.search.unwrap_or_default();
    let search = SearchSettings {
        stemmer: raw_search.stemmer.unwrap_or(search_defaults.stemmer),
        prefix_match: raw_search
            .prefix_match
            .unwrap_or(search_defaults.prefix_match),
        candidate_pool: raw_search
            .candidate_pool
            .unwrap_or(search_defaults.candidate_pool),
        query_timeout_ms: raw_search
            .query_timeout_ms
            .unwrap_or(search_defaults.query_timeout_ms),
        max_variants: raw_search
            .max_variants
            .unwrap_or(search_defaults.max_variants),
        max_combinations: raw_search
            .max_combinations
            .unwrap_or(search_defaults.max_combinations),
        snippet_max_chars: raw_search
            .snippet_max_chars
            .unwrap_or(search_defaults.snippet_max_chars),
    };

    let raw_dictionaries = raw.dictionaries.unwrap_or_default();
    let dictionaries = DictionarySettings {
        rewrites: raw_dictionaries
            .rewrites
            .map(|p| resolve_path(&p, config_dir))
            .transpose()?,
        synonyms: raw_dictionaries
            .synonyms
            .map(|p| resolve_path(&p, config_dir))
            .transpose()?,
    };

    let raw_index = raw.index.unwrap_or_default();
    let index = IndexSettings {
        path: resolve_path(
            raw_index.path.as_deref().unwrap_or(IndexSettings::DEFAULT_DIR),
            config_dir,
        )?,
    };

    Ok(Config {
        settings,
        search,
        dictionaries,
        index,
        config_root: Some(config_dir.to_path_buf()),
    })
}
