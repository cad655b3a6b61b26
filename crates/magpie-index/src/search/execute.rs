//! Query execution and row construction.

use std::{ops::Bound, time::Instant};

use magpie_query::parse_expression;
use tantivy::{
    TantivyDocument, Term,
    collector::TopDocs,
    query::{BooleanQuery, ConstScoreQuery, Occur, Query, RangeQuery, TermQuery},
    schema::{Field, IndexRecordOption, Value},
    snippet::SnippetGenerator,
};
use tracing::{debug, error, warn};

use super::{CollectionRef, SearchExecutor, SearchResult, merge::merge_rows};
use crate::{
    SearchError,
    crs::{BBox, Srid},
    deadline::{Deadline, DeadlineCollector},
};

impl SearchExecutor {
    /// Searches `collections` for `expression`.
    ///
    /// `expression` is a boolean match expression as rendered by
    /// [`magpie_query::BooleanQueryRenderer`]. Results are ranked, collapsed
    /// on `(display name, collection, version, feature id)` and truncated to
    /// `limit`, with bounding boxes in `srid`.
    pub fn search(
        &self,
        expression: &str,
        collections: &[CollectionRef],
        limit: usize,
        srid: Srid,
        deadline: &Deadline,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.search_within(expression, collections, limit, srid, None, deadline)
    }

    /// Like [`Self::search`], keeping only features whose bounding box
    /// intersects `bbox` (WGS84) when one is given.
    ///
    /// Each row's rank is its text score weighted by the relevance of the
    /// collection it came from.
    pub fn search_within(
        &self,
        expression: &str,
        collections: &[CollectionRef],
        limit: usize,
        srid: Srid,
        bbox: Option<&BBox>,
        deadline: &Deadline,
    ) -> Result<Vec<SearchResult>, SearchError> {
        deadline.check()?;
        if collections.is_empty() {
            return Err(SearchError::Validation(
                "no collections specified".to_string(),
            ));
        }

        let expr = match parse_expression(expression)
            .map_err(|e| SearchError::Validation(e.format_with_context()))?
        {
            Some(expr) => expr,
            None => return Ok(Vec::new()),
        };
        deadline.check()?;
        let content = match self.compiler.compile(&expr) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };
        deadline.check()?;

        let mut clauses = vec![
            (Occur::Must, content),
            (Occur::Must, self.collection_filter(collections)),
        ];
        if let Some(bbox) = bbox {
            clauses.push((Occur::Must, self.bbox_filter(bbox)));
        }
        let query = BooleanQuery::new(clauses);

        let started = Instant::now();
        let searcher = self.reader.searcher();
        let collector = DeadlineCollector::new(
            TopDocs::with_limit(self.candidate_pool.max(limit).max(1)),
            deadline.clone(),
        );
        let top_docs = searcher
            .search(&query, &collector)
            .map_err(|e| Self::failure(deadline, &e))?;

        let snippets = match self.compiler.highlight_query(&expr) {
            Some(hq) => {
                let mut generator =
                    SnippetGenerator::create(&searcher, hq.as_ref(), self.schema.suggest)
                        .map_err(|e| Self::failure(deadline, &e))?;
                generator.set_max_num_chars(self.snippet_max_chars);
                Some(generator)
            }
            None => None,
        };

        let mut rows = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            deadline.check()?;
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Self::failure(deadline, &e))?;
            let mut row = self.row_from_doc(&doc, score, snippets.as_ref(), srid)?;
            let relevance = relevance_of(collections, &row);
            row.rank *= relevance;
            rows.push(row);
        }

        let candidates = rows.len();
        let results = merge_rows(rows, limit);
        debug!(
            expression,
            candidates,
            returned = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search complete"
        );
        Ok(results)
    }

    /// Matches documents of any of the given collection versions, without scoring.
    fn collection_filter(&self, collections: &[CollectionRef]) -> Box<dyn Query> {
        let pairs: Vec<(Occur, Box<dyn Query>)> = collections
            .iter()
            .map(|c| {
                let pair: Box<dyn Query> = Box::new(BooleanQuery::new(vec![
                    (
                        Occur::Must,
                        Box::new(TermQuery::new(
                            Term::from_field_text(self.schema.collection_id, &c.name),
                            IndexRecordOption::Basic,
                        )) as Box<dyn Query>,
                    ),
                    (
                        Occur::Must,
                        Box::new(TermQuery::new(
                            Term::from_field_u64(self.schema.collection_version, c.version),
                            IndexRecordOption::Basic,
                        )),
                    ),
                ]));
                (Occur::Should, pair)
            })
            .collect();
        Box::new(ConstScoreQuery::new(Box::new(BooleanQuery::new(pairs)), 0.0))
    }

    /// Matches documents whose bounding box intersects `bbox`, without scoring.
    fn bbox_filter(&self, bbox: &BBox) -> Box<dyn Query> {
        let ranges = [
            (self.schema.bbox_min_x, Bound::Unbounded, Bound::Included(bbox.max_x)),
            (self.schema.bbox_max_x, Bound::Included(bbox.min_x), Bound::Unbounded),
            (self.schema.bbox_min_y, Bound::Unbounded, Bound::Included(bbox.max_y)),
            (self.schema.bbox_max_y, Bound::Included(bbox.min_y), Bound::Unbounded),
        ];
        let clauses: Vec<(Occur, Box<dyn Query>)> = ranges
            .into_iter()
            .map(|(field, lower, upper)| {
                let name = self.schema.schema().get_field_name(field).to_string();
                let range: Box<dyn Query> =
                    Box::new(RangeQuery::new_f64_bounds(name, lower, upper));
                (Occur::Must, range)
            })
            .collect();
        Box::new(ConstScoreQuery::new(Box::new(BooleanQuery::new(clauses)), 0.0))
    }

    /// Maps a Tantivy failure to a search error.
    ///
    /// The deadline collector aborts with a Tantivy error, so an expired or
    /// cancelled deadline takes precedence over the error itself.
    fn failure(deadline: &Deadline, err: &tantivy::TantivyError) -> SearchError {
        if let Err(stopped) = deadline.check() {
            warn!(error = %stopped, "search stopped");
            return stopped;
        }
        error!(error = %err, "search index failure");
        SearchError::Datastore(err.to_string())
    }

    /// Builds a result row from a stored document.
    fn row_from_doc(
        &self,
        doc: &TantivyDocument,
        score: f32,
        snippets: Option<&SnippetGenerator>,
        srid: Srid,
    ) -> Result<SearchResult, SearchError> {
        let suggest = text_field(doc, self.schema.suggest, "suggest")?;
        let highlight = snippets
            .map(|generator| generator.snippet_from_doc(doc))
            .filter(|snippet| !snippet.is_empty())
            .map_or(suggest, |snippet| snippet.to_html());

        let bbox = BBox {
            min_x: f64_field(doc, self.schema.bbox_min_x, "bbox_min_x")?,
            min_y: f64_field(doc, self.schema.bbox_min_y, "bbox_min_y")?,
            max_x: f64_field(doc, self.schema.bbox_max_x, "bbox_max_x")?,
            max_y: f64_field(doc, self.schema.bbox_max_y, "bbox_max_y")?,
        };

        Ok(SearchResult {
            display_name: text_field(doc, self.schema.display_name, "display_name")?,
            feature_id: text_field(doc, self.schema.feature_id, "feature_id")?,
            collection_id: text_field(doc, self.schema.collection_id, "collection_id")?,
            collection_version: doc
                .get_first(self.schema.collection_version)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| missing("collection_version"))?,
            geometry_type: text_field(doc, self.schema.geometry_type, "geometry_type")?,
            bbox: bbox.reproject(srid),
            rank: score,
            highlight,
        })
    }
}

/// Relevance of the collection version `row` came from.
fn relevance_of(collections: &[CollectionRef], row: &SearchResult) -> f32 {
    collections
        .iter()
        .find(|c| c.name == row.collection_id && c.version == row.collection_version)
        .map_or(CollectionRef::DEFAULT_RELEVANCE, |c| c.relevance)
}

/// Error for a stored field that is absent or has the wrong type.
fn missing(name: &str) -> SearchError {
    error!(field = name, "indexed document lacks a stored field");
    SearchError::Datastore(format!("document is missing stored field {name}"))
}

/// Reads a stored text field.
fn text_field(doc: &TantivyDocument, field: Field, name: &str) -> Result<String, SearchError> {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| missing(name))
}

/// Reads a stored f64 field.
fn f64_field(doc: &TantivyDocument, field: Field, name: &str) -> Result<f64, SearchError> {
    doc.get_first(field)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| missing(name))
}
