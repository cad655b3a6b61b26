//! Literal phrase rewrites.
//!
//! A rewrite rule maps one or more alternative phrases onto a canonical
//! phrase, e.g. `gravenhage,den haag`. Rewriting happens before tokenisation,
//! so alternatives may span several words.

use std::{collections::BTreeMap, path::Path};

use magpie_config::ConfigError;

use crate::dictionary::{Rule, read_rules};

/// Immutable table of phrase rewrites.
#[derive(Debug, Clone, Default)]
pub struct RewriteTable {
    /// Canonical phrase to its alternatives, merged across rows.
    rules: BTreeMap<String, Vec<String>>,
    /// `(alternative, canonical)` pairs, longest alternative first.
    patterns: Vec<(String, String)>,
    /// Canonicals with at least one alternative, longest first.
    canonicals: Vec<String>,
}

impl RewriteTable {
    /// Loads a rewrite table from a CSV dictionary.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::from_rules(read_rules(path)?))
    }

    /// Builds a table from parsed rules. Rows sharing a canonical are merged.
    ///
    /// When the same alternative is listed under two canonicals the first one
    /// in file order wins.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut patterns: Vec<(String, String)> = Vec::new();

        for rule in rules {
            let alternatives = merged.entry(rule.canonical.clone()).or_default();
            for alt in rule.alternatives {
                if alt == rule.canonical || patterns.iter().any(|(a, _)| *a == alt) {
                    continue;
                }
                alternatives.push(alt.clone());
                patterns.push((alt, rule.canonical.clone()));
            }
        }

        patterns.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        merged.retain(|_, alternatives| !alternatives.is_empty());
        let mut canonicals: Vec<String> = merged.keys().cloned().collect();
        canonicals.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Self {
            rules: merged,
            patterns,
            canonicals,
        }
    }

    /// Returns true if the table holds no rewrites.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns the alternatives registered for a canonical phrase.
    pub fn alternatives(&self, canonical: &str) -> &[String] {
        self.rules.get(canonical).map(Vec::as_slice).unwrap_or_default()
    }

    /// Lower-cases `text` and replaces every alternative with its canonical form.
    ///
    /// The text is scanned once from left to right. At each position the
    /// longest matching alternative is replaced and scanning resumes after
    /// it; replaced text is never rescanned. A canonical phrase at least as
    /// long as the alternative matching at the same position is kept as is,
    /// so `str -> straat` leaves `straat` alone.
    pub fn apply(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        if self.patterns.is_empty() {
            return lowered;
        }

        let mut out = String::with_capacity(lowered.len());
        let mut rest = lowered.as_str();
        while let Some(ch) = rest.chars().next() {
            let alternative = self
                .patterns
                .iter()
                .find(|(alt, _)| rest.starts_with(alt.as_str()));
            let canonical = self
                .canonicals
                .iter()
                .find(|canonical| rest.starts_with(canonical.as_str()));
            match (alternative, canonical) {
                (_, Some(kept))
                    if alternative.is_none_or(|(alt, _)| kept.len() >= alt.len()) =>
                {
                    out.push_str(kept);
                    rest = &rest[kept.len()..];
                }
                (Some((alt, canonical)), _) => {
                    out.push_str(canonical);
                    rest = &rest[alt.len()..];
                }
                _ => {
                    out.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rules: &[(&str, &[&str])]) -> RewriteTable {
        RewriteTable::from_rules(rules.iter().map(|(c, alts)| Rule::new(c, alts)))
    }

    #[test]
    fn replaces_phrase_case_insensitively() {
        let t = table(&[("gravenhage", &["den haag"])]);
        assert_eq!(t.apply("Spui 1 den Haag"), "spui 1 gravenhage");
    }

    #[test]
    fn empty_table_only_lowercases() {
        let t = RewriteTable::default();
        assert!(t.is_empty());
        assert_eq!(t.apply("Damrak 1"), "damrak 1");
    }

    #[test]
    fn replaces_every_occurrence() {
        let t = table(&[("straat", &["str."])]);
        assert_eq!(t.apply("str. str."), "straat straat");
    }

    #[test]
    fn longest_alternative_wins() {
        let t = table(&[("gravenhage", &["den haag", "haag"]), ("holland", &["holl"])]);
        assert_eq!(t.apply("den haag"), "gravenhage");
        assert_eq!(t.apply("haag"), "gravenhage");
        assert_eq!(t.apply("noord holl"), "noord holland");
    }

    #[test]
    fn rule_order_does_not_matter() {
        let a = table(&[("gravenhage", &["den haag"]), ("1ste", &["eerste"])]);
        let b = table(&[("1ste", &["eerste"]), ("gravenhage", &["den haag"])]);
        let input = "Eerste Laan den haag";
        assert_eq!(a.apply(input), b.apply(input));
        assert_eq!(a.apply(input), "1ste laan gravenhage");
    }

    #[test]
    fn apply_is_idempotent() {
        let t = table(&[("gravenhage", &["den haag"]), ("sint", &["st."])]);
        for input in ["Den Haag", "St. Jacobsstraat den haag", "nothing here"] {
            let once = t.apply(input);
            assert_eq!(t.apply(&once), once);
        }
    }

    #[test]
    fn canonical_containing_its_alternative_is_kept() {
        let t = table(&[("straat", &["str"])]);
        assert_eq!(t.apply("Straat"), "straat");
        assert_eq!(t.apply("str"), "straat");
        assert_eq!(t.apply("kerkstr hoofdstraat"), "kerkstraat hoofdstraat");
        for input in ["straat", "str", "dorpsstraat str"] {
            let once = t.apply(input);
            assert_eq!(t.apply(&once), once, "not idempotent for {input}");
        }
    }

    #[test]
    fn longer_alternative_beats_canonical() {
        let t = table(&[("str", &["straat"])]);
        assert_eq!(t.apply("straat"), "str");
        assert_eq!(t.apply("str"), "str");
    }

    #[test]
    fn replaced_text_is_not_rescanned() {
        // "ab" -> "b" leaves "bb", which must not be rewritten to "c" in the same pass.
        let t = table(&[("b", &["ab"]), ("c", &["bb"])]);
        assert_eq!(t.apply("abb"), "bb");
    }

    #[test]
    fn rows_with_same_canonical_merge() {
        let t = table(&[("gravenhage", &["den haag"]), ("gravenhage", &["s-gravenhage"])]);
        assert_eq!(t.alternatives("gravenhage"), ["den haag", "s-gravenhage"]);
        assert_eq!(t.apply("s-gravenhage"), "gravenhage");
    }

    #[test]
    fn handles_multibyte_text() {
        let t = table(&[("fryslân", &["friesland"])]);
        assert_eq!(t.apply("Leeuwarden Friesland é"), "leeuwarden fryslân é");
    }
}
