//! Reading `canonical,alt1,alt2,...` dictionary files.
//!
//! Both the rewrite and the synonym tables are stored in the same CSV shape:
//! one rule per row, the first cell is the canonical form and every further
//! cell is an alternative. Rows may have any number of cells, lines starting
//! with `#` are comments and blank lines are skipped.

use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use magpie_config::ConfigError;

/// One dictionary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// The canonical spelling, lower-cased.
    pub canonical: String,
    /// Alternative spellings in file order, lower-cased, without empties.
    pub alternatives: Vec<String>,
}

impl Rule {
    /// Creates a rule from string slices, lower-casing every cell.
    pub fn new(canonical: &str, alternatives: &[&str]) -> Self {
        Self {
            canonical: canonical.to_lowercase(),
            alternatives: alternatives.iter().map(|a| a.to_lowercase()).collect(),
        }
    }
}

/// Reads all rules from a dictionary file.
pub fn read_rules(path: &Path) -> Result<Vec<Rule>, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::ReadDictionary {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rules(file, path)
}

/// Parses rules from any reader. `path` is only used in error messages.
pub fn parse_rules<R: Read>(reader: R, path: &Path) -> Result<Vec<Rule>, ConfigError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut rules = Vec::new();
    for record in csv.records() {
        let record = record.map_err(|e| ConfigError::ParseDictionary {
            path: path.to_path_buf(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let mut cells = record.iter();
        let canonical = cells.next().unwrap_or_default().to_lowercase();
        if canonical.is_empty() {
            return Err(ConfigError::ParseDictionary {
                path: path.to_path_buf(),
                line,
                message: "empty canonical form in first column".into(),
            });
        }

        let alternatives = cells
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
            .collect();
        rules.push(Rule {
            canonical,
            alternatives,
        });
    }

    Ok(rules)
}
