//! Query expansion: rewrites, tokenisation and per-token synonym variants.
//!
//! Expansion of a single token is a worklist over its variant list. Each
//! variant is scanned for every synonym key; each `(match, replacement)`
//! pair is a [`Position`]. Longer matches shadow shorter ones they overlap,
//! so `gouv` inside `gouverneur` is never replaced on its own. New variants
//! are appended to the list and scanned in turn.
//!
//! Two rules keep the worklist finite: a variant is never added twice, and a
//! replacement that starts with the text it replaces is skipped (otherwise
//! `oud -> oude` would keep growing `oudeeee...`). The per-token variant cap
//! bounds whatever pathological dictionaries get past those rules.
//!
//! Variant counts multiply across tokens, so a whole query is also held to a
//! cap on combinations: the longest variant lists lose their last entries
//! until the product fits.

use std::collections::HashSet;

use magpie_config::{ConfigError, DictionarySettings, SearchSettings};
use tracing::{debug, warn};

use crate::{
    rewrite::RewriteTable,
    search_query::{SearchQuery, TokenVariants},
    synonyms::SynonymTable,
};

/// The operator sequence for "followed by" in the match expression syntax.
const FOLLOWED_BY: &str = "<->";

/// Characters with a meaning in the match expression syntax.
const OPERATOR_CHARS: [char; 5] = ['&', '|', '!', '(', ')'];

/// A candidate substitution inside one variant.
#[derive(Debug, Clone, Copy)]
struct Position<'a> {
    /// Byte offset of the match.
    start: usize,
    /// Byte length of the match.
    length: usize,
    /// The synonym key that matched.
    matched: &'a str,
    /// The text to put in its place.
    replacement: &'a str,
}

impl Position<'_> {
    /// Byte offset just past the match.
    fn end(&self) -> usize {
        self.start + self.length
    }

    /// True if a strictly longer position overlaps this one.
    fn is_shadowed_by_any(&self, positions: &[Self]) -> bool {
        positions.iter().any(|other| {
            other.length > self.length && self.start < other.end() && other.start < self.end()
        })
    }

    /// True if the replacement would reintroduce the matched text at the same spot.
    fn regrows_match(&self) -> bool {
        self.replacement.starts_with(self.matched)
    }

    /// Applies this substitution to `variant`.
    fn apply(&self, variant: &str) -> String {
        let mut out = String::with_capacity(variant.len() + self.replacement.len());
        out.push_str(&variant[..self.start]);
        out.push_str(self.replacement);
        out.push_str(&variant[self.end()..]);
        out
    }
}

/// Result of expanding one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Variants in discovery order, the original token first.
    pub variants: Vec<String>,
    /// True if expansion stopped because the variant cap was reached.
    pub truncated: bool,
}

/// Finds every (possibly overlapping) occurrence of every synonym key.
///
/// The result is ordered by match length descending, then start ascending.
fn find_positions<'a>(variant: &str, synonyms: &'a SynonymTable) -> Vec<Position<'a>> {
    let mut positions = Vec::new();
    for (key, replacements) in synonyms.iter() {
        if key.is_empty() {
            continue;
        }
        let mut from = 0;
        while let Some(offset) = variant[from..].find(key) {
            let start = from + offset;
            positions.extend(replacements.iter().map(|replacement| Position {
                start,
                length: key.len(),
                matched: key,
                replacement,
            }));
            from = start + variant[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    positions.sort_by(|a, b| b.length.cmp(&a.length).then(a.start.cmp(&b.start)));
    positions
}

/// Expands `token` into all its synonym variants, stopping at `max_variants`.
pub fn expand_variants(token: &str, synonyms: &SynonymTable, max_variants: usize) -> Expansion {
    let mut variants = vec![token.to_string()];
    let mut seen: HashSet<String> = variants.iter().cloned().collect();
    if synonyms.is_empty() {
        return Expansion {
            variants,
            truncated: false,
        };
    }

    let mut next = 0;
    while next < variants.len() {
        let current = variants[next].clone();
        let positions = find_positions(&current, synonyms);
        for position in &positions {
            if position.regrows_match() || position.is_shadowed_by_any(&positions) {
                continue;
            }
            let candidate = position.apply(&current);
            if seen.contains(&candidate) {
                continue;
            }
            if variants.len() >= max_variants {
                return Expansion {
                    variants,
                    truncated: true,
                };
            }
            seen.insert(candidate.clone());
            variants.push(candidate);
        }
        next += 1;
    }

    Expansion {
        variants,
        truncated: false,
    }
}

/// Number of conjunctions `lists` render to, saturating.
fn product(lists: &[(&str, Vec<String>)]) -> usize {
    lists
        .iter()
        .fold(1, |acc, (_, variants)| acc.saturating_mul(variants.len()))
}

/// Drops trailing variants from the longest lists until the product of the
/// list lengths is at most `max_combinations`.
///
/// The token itself is never dropped. Returns true if anything was dropped.
fn limit_combinations(lists: &mut [(&str, Vec<String>)], max_combinations: usize) -> bool {
    let mut dropped = false;
    while product(lists) > max_combinations.max(1) {
        let Some((_, longest)) = lists
            .iter_mut()
            .filter(|(_, variants)| variants.len() > 1)
            .max_by_key(|(_, variants)| variants.len())
        else {
            break;
        };
        longest.pop();
        dropped = true;
    }
    dropped
}

/// Replaces match-expression operators with spaces.
pub fn sanitize(text: &str) -> String {
    text.replace(FOLLOWED_BY, " ")
        .chars()
        .map(|c| if OPERATOR_CHARS.contains(&c) { ' ' } else { c })
        .collect()
}

/// Turns raw query text into a [`SearchQuery`].
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    /// Phrase rewrites applied before tokenisation.
    rewrites: RewriteTable,
    /// Token-level synonyms.
    synonyms: SynonymTable,
    /// Hard per-token variant cap.
    max_variants: usize,
    /// Cap on conjunctions for a whole query.
    max_combinations: usize,
}

impl QueryExpander {
    /// Creates an expander from already loaded tables, with the default
    /// combination cap.
    pub fn new(rewrites: RewriteTable, synonyms: SynonymTable, max_variants: usize) -> Self {
        Self {
            rewrites,
            synonyms,
            max_variants,
            max_combinations: SearchSettings::DEFAULT_MAX_COMBINATIONS,
        }
    }

    /// Sets the cap on conjunctions per query. Zero is treated as one.
    #[must_use]
    pub fn with_max_combinations(mut self, max_combinations: usize) -> Self {
        self.max_combinations = max_combinations.max(1);
        self
    }

    /// Loads the configured dictionaries and checks the synonym table against
    /// the variant cap. A missing dictionary path yields an empty table.
    pub fn from_config(
        dictionaries: &DictionarySettings,
        search: &SearchSettings,
    ) -> Result<Self, ConfigError> {
        let max_variants = search.max_variants;
        let rewrites = match &dictionaries.rewrites {
            Some(path) => RewriteTable::load(path)?,
            None => RewriteTable::default(),
        };
        let synonyms = match &dictionaries.synonyms {
            Some(path) => SynonymTable::load(path)?,
            None => SynonymTable::default(),
        };
        synonyms.check_expansion_limit(max_variants)?;
        debug!(
            synonyms = synonyms.len(),
            rewrites = !rewrites.is_empty(),
            "loaded dictionaries"
        );
        Ok(Self::new(rewrites, synonyms, max_variants)
            .with_max_combinations(search.max_combinations))
    }

    /// The rewrite table in use.
    pub fn rewrites(&self) -> &RewriteTable {
        &self.rewrites
    }

    /// The synonym table in use.
    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Expands raw query text.
    ///
    /// The text is lower-cased, stripped of operator characters, rewritten and
    /// split on whitespace. Repeated tokens share one variant list. Variant
    /// lists are trimmed so the query renders to at most the combination cap.
    pub fn expand(&self, raw: &str) -> SearchQuery {
        let rewritten = self.rewrites.apply(&sanitize(raw));

        let mut seen = HashSet::new();
        let mut lists: Vec<(&str, Vec<String>)> = rewritten
            .split_whitespace()
            .filter(|token| seen.insert(*token))
            .map(|token| (token, self.expand_token(token)))
            .collect();

        if limit_combinations(&mut lists, self.max_combinations) {
            warn!(
                query = rewritten.as_str(),
                limit = self.max_combinations,
                "variants dropped to stay within the combination cap"
            );
        }

        SearchQuery::new(
            lists
                .into_iter()
                .map(|(token, variants)| TokenVariants::new(token, variants))
                .collect(),
        )
    }

    /// Returns every synonym variant of `text`, `text` itself first.
    ///
    /// `text` is used as is; it may contain spaces.
    pub fn expand_token(&self, text: &str) -> Vec<String> {
        let expansion = expand_variants(text, &self.synonyms, self.max_variants);
        if expansion.truncated {
            warn!(
                token = text,
                limit = self.max_variants,
                "synonym expansion truncated at variant cap"
            );
        }
        expansion.variants
    }
}
