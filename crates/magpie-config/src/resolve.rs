//! Path resolution for configured files.
//!
//! Resolves relative and tilde-prefixed paths against the directory holding
//! the configuration file.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::ConfigError;

/// Resolves a configured path to an absolute path.
///
/// Handles three cases:
/// - Tilde paths (`~/dict`) - expanded to home directory
/// - Relative paths (`./dict`, `../shared`) - resolved relative to `config_dir`
/// - Absolute paths - returned as-is
///
/// The path does not have to exist yet; missing dictionaries are reported when
/// they are loaded.
pub fn resolve_path(path: &str, config_dir: &Path) -> Result<PathBuf, ConfigError> {
    let expanded = expand_tilde(path)?;

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(config_dir.join(expanded))
    }
}

/// Expands a tilde prefix to the home directory.
fn expand_tilde(path: &str) -> Result<PathBuf, ConfigError> {
    if path == "~" {
        return home_dir();
    }

    if let Some(rest) = path.strip_prefix("~/") {
        let home = home_dir()?;
        return Ok(home.join(rest));
    }

    Ok(PathBuf::from(path))
}

/// Returns the user's home directory.
fn home_dir() -> Result<PathBuf, ConfigError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDirectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_unchanged() {
        let resolved = resolve_path("/data/synonyms.csv", Path::new("/srv")).unwrap();
        assert_eq!(resolved, PathBuf::from("/data/synonyms.csv"));
    }

    #[test]
    fn relative_path_joined() {
        let resolved = resolve_path("dict/rewrites.csv", Path::new("/srv")).unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/dict/rewrites.csv"));
    }

    #[test]
    fn tilde_expanded() {
        let resolved = resolve_path("~/dict.csv", Path::new("/srv")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("dict.csv"));
        assert!(!resolved.starts_with("/srv"));
    }
}
