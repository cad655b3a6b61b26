//! Compiles match expressions into Tantivy queries over the `suggest` field.

use magpie_query::MatchExpr;
use tantivy::{
    Term,
    query::{BooleanQuery, FuzzyTermQuery, Occur, PhraseQuery, Query, TermQuery},
    schema::{Field, IndexRecordOption},
    tokenizer::TextAnalyzer,
};

use crate::analyzer::analyze;

/// Compiles [`MatchExpr`] trees into Tantivy queries.
///
/// Each term is analysed like indexed text. A term that analyses to several
/// tokens becomes a phrase query. A single token becomes a term query, and
/// with prefix matching also matches any indexed token it is a prefix of;
/// exact matches then score above prefix-only matches.
#[derive(Clone)]
pub struct ExpressionCompiler {
    /// Field to search.
    field: Field,
    /// Analyzer matching the one used at index time.
    analyzer: TextAnalyzer,
    /// Whether single tokens also match by prefix.
    prefix_match: bool,
}

impl ExpressionCompiler {
    /// Creates a compiler for `field`.
    pub fn new(field: Field, analyzer: TextAnalyzer, prefix_match: bool) -> Self {
        Self {
            field,
            analyzer,
            prefix_match,
        }
    }

    /// Compiles `expr`. Returns `None` when no term survives analysis.
    pub fn compile(&self, expr: &MatchExpr) -> Option<Box<dyn Query>> {
        let mut analyzer = self.analyzer.clone();
        self.compile_with(&mut analyzer, expr)
    }

    /// Builds a query of exact analysed terms, for snippet highlighting.
    pub fn highlight_query(&self, expr: &MatchExpr) -> Option<Box<dyn Query>> {
        let mut analyzer = self.analyzer.clone();
        let mut tokens: Vec<String> = expr
            .terms()
            .into_iter()
            .flat_map(|term| analyze(&mut analyzer, term))
            .collect();
        tokens.sort_unstable();
        tokens.dedup();
        if tokens.is_empty() {
            return None;
        }

        let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
            .iter()
            .map(|token| (Occur::Should, self.term_query(token)))
            .collect();
        Some(Box::new(BooleanQuery::new(clauses)))
    }

    /// Compiles `expr` reusing one analyzer instance.
    fn compile_with(
        &self,
        analyzer: &mut TextAnalyzer,
        expr: &MatchExpr,
    ) -> Option<Box<dyn Query>> {
        match expr {
            MatchExpr::Term(text) => self.compile_term(analyzer, text),
            MatchExpr::And(exprs) => self.compile_bool(analyzer, exprs, Occur::Must),
            MatchExpr::Or(exprs) => self.compile_bool(analyzer, exprs, Occur::Should),
        }
    }

    /// Compiles the children of an And or Or node.
    fn compile_bool(
        &self,
        analyzer: &mut TextAnalyzer,
        exprs: &[MatchExpr],
        occur: Occur,
    ) -> Option<Box<dyn Query>> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = exprs
            .iter()
            .filter_map(|e| self.compile_with(analyzer, e))
            .map(|q| (occur, q))
            .collect();
        if clauses.is_empty() {
            return None;
        }
        Some(Box::new(BooleanQuery::new(clauses)))
    }

    /// Compiles a single term.
    fn compile_term(&self, analyzer: &mut TextAnalyzer, text: &str) -> Option<Box<dyn Query>> {
        let tokens = analyze(analyzer, text);
        match tokens.as_slice() {
            [] => None,
            [token] if self.prefix_match => {
                let exact = self.term_query(token);
                let prefix: Box<dyn Query> = Box::new(FuzzyTermQuery::new_prefix(
                    Term::from_field_text(self.field, token),
                    0,
                    true,
                ));
                Some(Box::new(BooleanQuery::new(vec![
                    (Occur::Should, exact),
                    (Occur::Should, prefix),
                ])))
            }
            [token] => Some(self.term_query(token)),
            _ => {
                let terms: Vec<Term> = tokens
                    .iter()
                    .map(|t| Term::from_field_text(self.field, t))
                    .collect();
                Some(Box::new(PhraseQuery::new(terms)))
            }
        }
    }

    /// Exact term query with frequencies for BM25 scoring.
    fn term_query(&self, token: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(self.field, token),
            IndexRecordOption::WithFreqs,
        ))
    }
}

#[cfg(test)]
mod tests {
    use magpie_query::parse_expression;

    use super::*;
    use crate::{analyzer::build_analyzer_from_name, schema::IndexSchema};

    fn compiler(prefix_match: bool) -> ExpressionCompiler {
        let schema = IndexSchema::new();
        ExpressionCompiler::new(
            schema.suggest,
            build_analyzer_from_name("dutch").unwrap(),
            prefix_match,
        )
    }

    fn compile(input: &str, prefix_match: bool) -> Option<Box<dyn Query>> {
        let expr = parse_expression(input).unwrap()?;
        compiler(prefix_match).compile(&expr)
    }

    #[test]
    fn single_term_exact() {
        let q = compile("(spui)", false).unwrap();
        assert!(format!("{q:?}").contains("TermQuery"));
    }

    #[test]
    fn single_term_with_prefix() {
        let q = compile("(spui)", true).unwrap();
        let debug = format!("{q:?}");
        assert!(debug.contains("FuzzyTermQuery"));
        assert!(debug.contains("TermQuery"));
    }

    #[test]
    fn multi_word_term_is_phrase() {
        let q = compile("(den haag & 1)", true).unwrap();
        assert!(format!("{q:?}").contains("PhraseQuery"));
    }

    #[test]
    fn or_of_ands() {
        let q = compile("(a1 & b2) | (c3 & d4)", false).unwrap();
        let debug = format!("{q:?}");
        assert!(debug.contains("Should"));
        assert!(debug.contains("Must"));
    }

    #[test]
    fn punctuation_only_term_compiles_to_nothing() {
        assert!(compile("(-)", false).is_none());
    }

    #[test]
    fn highlight_query_uses_exact_terms() {
        let expr = parse_expression("(spui & 1) | (spui & 2)").unwrap().unwrap();
        let q = compiler(true).highlight_query(&expr).unwrap();
        let debug = format!("{q:?}");
        assert!(!debug.contains("FuzzyTermQuery"));
        assert!(debug.contains("TermQuery"));
    }
}
