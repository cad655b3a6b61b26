//! End-to-end expansion against the CSV fixtures.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use magpie_config::{ConfigError, DictionarySettings, SearchSettings};
use magpie_query::{
    BooleanQueryRenderer, MatchExpr, QueryExpander, RewriteTable, SynonymTable, parse_expression,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn expander() -> QueryExpander {
    let dictionaries = DictionarySettings {
        rewrites: Some(fixture("rewrites.csv")),
        synonyms: Some(fixture("synonyms.csv")),
    };
    QueryExpander::from_config(&dictionaries, &SearchSettings::default()).unwrap()
}

fn render(input: &str) -> String {
    BooleanQueryRenderer::render(&expander().expand(input))
}

#[test]
fn unmatched_token_renders_alone() {
    assert_eq!(render("foobar"), "(foobar)");
}

#[test]
fn rewrite_then_tokenise() {
    assert_eq!(render("Spui 1 den Haag"), "(spui & 1 & gravenhage)");
}

#[test]
fn numbered_street_synonyms() {
    assert_eq!(
        render("eerste 2de"),
        "(1ste & 2de) | (1ste & tweede) | (eerste & 2de) | (eerste & tweede)"
    );
}

#[test]
fn mixed_case_rewrite_and_synonym() {
    assert_eq!(
        render("OudE DeN HaAg"),
        "(oud & gravenhage) | (oude & gravenhage)"
    );
}

#[test]
fn unicode_synonym() {
    assert_eq!(
        render("oude fryslân"),
        "(oud & friesland) | (oud & fryslân) | (oude & friesland) | (oude & fryslân)"
    );
}

#[test]
fn substring_synonyms_inside_compound_word() {
    assert_eq!(
        render("1e Gouverneurstraat 1800"),
        "(1e & goeverneurstraat & 1800) | (1e & goevstraat & 1800) | \
         (1e & gouverneurstraat & 1800) | (1e & gouvstraat & 1800)"
    );
}

#[test]
fn operators_are_stripped() {
    assert_eq!(render("A & B !C D <-> E"), "(a & b & c & d & e)");
}

#[test]
fn repeated_tokens_share_variants() {
    assert_eq!(render("eerste eerste"), "(1ste) | (eerste)");
}

#[test]
fn synonym_expansion_is_symmetric() {
    let e = expander();
    for (x, y) in [("eerste", "1ste"), ("tweede", "2de"), ("fryslân", "friesland")] {
        assert!(e.expand_token(x).iter().any(|v| v == y), "{x} -> {y}");
        assert!(e.expand_token(y).iter().any(|v| v == x), "{y} -> {x}");
    }
}

#[test]
fn variant_sets_have_no_duplicates() {
    let e = expander();
    for token in ["gouverneur", "goev", "gouvgoev", "oudeoud", "eerste2de"] {
        let variants = e.expand_token(token);
        let unique: BTreeSet<_> = variants.iter().collect();
        assert_eq!(unique.len(), variants.len(), "duplicates for {token}");
    }
}

#[test]
fn rewrite_is_idempotent() {
    let rewrites = RewriteTable::load(&fixture("rewrites.csv")).unwrap();
    for input in ["Spui 1 den Haag", "den haag den haag", "Laan van Meerdervoort"] {
        let once = rewrites.apply(input);
        assert_eq!(rewrites.apply(&once), once);
    }
}

#[test]
fn rendered_expression_parses() {
    let rendered = render("eerste 2de");
    let expr = parse_expression(&rendered).unwrap().unwrap();
    match &expr {
        MatchExpr::Or(conjunctions) => assert_eq!(conjunctions.len(), 4),
        other => panic!("expected Or, got {other:?}"),
    }
    assert_eq!(expr.to_string(), rendered);
}

#[test]
fn missing_dictionary_is_config_error() {
    let err = SynonymTable::load(&fixture("does-not-exist.csv")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadDictionary { .. }));
}

#[test]
fn no_dictionaries_configured() {
    let search = SearchSettings {
        max_variants: 16,
        ..SearchSettings::default()
    };
    let e = QueryExpander::from_config(&DictionarySettings::default(), &search).unwrap();
    assert!(e.synonyms().is_empty());
    assert!(e.rewrites().is_empty());
    assert_eq!(
        BooleanQueryRenderer::render(&e.expand("Eerste 2de")),
        "(eerste & 2de)"
    );
}

#[test]
fn explosive_dictionary_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("synonyms.csv");
    fs::write(&path, "goeverneur,goev,gouverneur,gouv\n").unwrap();

    let dictionaries = DictionarySettings {
        rewrites: None,
        synonyms: Some(path),
    };
    let search = SearchSettings {
        max_variants: 3,
        ..SearchSettings::default()
    };
    let err = QueryExpander::from_config(&dictionaries, &search).unwrap_err();
    assert!(matches!(err, ConfigError::ExpansionLimit { limit: 3, .. }));
}

#[test]
fn combination_cap_bounds_rendered_expression() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("synonyms.csv");
    fs::write(&path, "ae,a\n").unwrap();
    let dictionaries = DictionarySettings {
        rewrites: None,
        synonyms: Some(path),
    };
    let search = SearchSettings {
        max_combinations: 100,
        ..SearchSettings::default()
    };
    let e = QueryExpander::from_config(&dictionaries, &search).unwrap();

    let raw = (0..7)
        .map(|i| format!("{}{i}", "ae".repeat(10)))
        .collect::<Vec<_>>()
        .join(" ");
    let query = e.expand(&raw);
    assert!(query.combinations() <= 100);

    let rendered = BooleanQueryRenderer::render(&query);
    match parse_expression(&rendered).unwrap().unwrap() {
        MatchExpr::Or(conjunctions) => assert_eq!(conjunctions.len(), query.combinations()),
        other => panic!("expected Or, got {other:?}"),
    }
}
