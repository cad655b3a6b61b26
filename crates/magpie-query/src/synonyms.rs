//! Bidirectional token-level synonyms.

use std::{collections::BTreeMap, path::Path};

use magpie_config::ConfigError;

use crate::{
    dictionary::{Rule, read_rules},
    expand::expand_variants,
};

/// Immutable, symmetric synonym map.
///
/// A row `canonical,alt1,alt2` makes `canonical` expand to both alternatives
/// and each alternative expand to `canonical` plus its siblings. Symmetry is
/// one hop only: rules from different rows are never chained at load time.
/// Keys and replacements are substrings, not necessarily whole words.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    /// Key to its replacements, in insertion order without duplicates.
    entries: BTreeMap<String, Vec<String>>,
}

impl SynonymTable {
    /// Loads a synonym table from a CSV dictionary.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::from_rules(read_rules(path)?))
    }

    /// Builds the symmetric map from parsed rules.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for rule in rules {
            for alt in &rule.alternatives {
                insert(&mut entries, &rule.canonical, alt);
            }
            for alt in &rule.alternatives {
                insert(&mut entries, alt, &rule.canonical);
                for sibling in &rule.alternatives {
                    insert(&mut entries, alt, sibling);
                }
            }
        }

        Self { entries }
    }

    /// Returns the replacements for an exact key, possibly empty.
    pub fn lookup(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterates over all keys and their replacements in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no synonyms.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expands every key as if it were a query token and fails if any of them
    /// produces more than `max_variants` variants.
    ///
    /// Every alternative is also a key, so this covers the whole dictionary.
    pub fn check_expansion_limit(&self, max_variants: usize) -> Result<(), ConfigError> {
        for key in self.entries.keys() {
            if expand_variants(key, self, max_variants).truncated {
                return Err(ConfigError::ExpansionLimit {
                    token: key.clone(),
                    limit: max_variants,
                });
            }
        }
        Ok(())
    }
}

/// Adds `value` under `key` unless it is the key itself or already present.
fn insert(entries: &mut BTreeMap<String, Vec<String>>, key: &str, value: &str) {
    if key == value {
        return;
    }
    let values = entries.entry(key.to_string()).or_default();
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
