//! Ranked search across versioned collections.
//!
//! A search runs in four steps:
//!
//! 1. **Compile** the match expression into a Tantivy query over `suggest`
//!    and restrict it to the requested `(collection, version)` pairs. There
//!    is no fallback to another version, so a collection can be re-indexed
//!    under a new version while the old one keeps serving. An optional
//!    search box further restricts hits to features whose bounding box
//!    intersects it.
//! 2. **Execute** under a [`Deadline`](crate::Deadline), collecting up to the
//!    candidate pool of BM25-ranked documents. See [`execute`].
//! 3. **Build rows** from stored fields, with a highlighted snippet and the
//!    bounding box in the requested CRS. The rank is the text score times
//!    the collection's relevance.
//! 4. **Merge**: collapse duplicate features, sort and truncate. See [`merge`].

mod execute;
mod merge;

use std::path::Path;

use magpie_config::SearchSettings;
use serde::Serialize;
use tantivy::{Index, IndexReader, directory::MmapDirectory};
use tracing::debug;

pub use self::merge::merge_rows;
use crate::{
    IndexError,
    analyzer::{MAGPIE_TOKENIZER, build_analyzer_from_name},
    compile::ExpressionCompiler,
    crs::BBox,
    schema::IndexSchema,
};

/// One collection at one exact version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionRef {
    /// Collection name.
    pub name: String,
    /// Collection version.
    pub version: u64,
    /// Weight in `0.0..=1.0` applied to the scores of this collection's hits.
    pub relevance: f32,
}

impl CollectionRef {
    /// Relevance of a collection the caller gave no weight for.
    pub const DEFAULT_RELEVANCE: f32 = 0.5;

    /// Creates a collection reference with the default relevance.
    pub fn new(name: impl Into<String>, version: u64) -> Self {
        Self {
            name: name.into(),
            version,
            relevance: Self::DEFAULT_RELEVANCE,
        }
    }

    /// Sets the relevance, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_relevance(mut self, relevance: f32) -> Self {
        self.relevance = if relevance.is_nan() {
            Self::DEFAULT_RELEVANCE
        } else {
            relevance.clamp(0.0, 1.0)
        };
        self
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Label shown to users.
    pub display_name: String,
    /// Feature identifier within the collection.
    pub feature_id: String,
    /// Collection the feature belongs to.
    pub collection_id: String,
    /// Collection version the hit came from.
    pub collection_version: u64,
    /// Geometry type of the feature.
    pub geometry_type: String,
    /// Bounding box in the requested CRS.
    pub bbox: BBox,
    /// Text score weighted by collection relevance; higher is better.
    pub rank: f32,
    /// `suggest` text with matched terms wrapped in `<b>` tags.
    pub highlight: String,
}

/// Executes ranked searches against an opened index.
///
/// Opened once and shared read-only between requests.
pub struct SearchExecutor {
    /// Reader that follows index commits.
    reader: IndexReader,
    /// Schema describing indexed fields.
    schema: IndexSchema,
    /// Compiles match expressions into Tantivy queries.
    compiler: ExpressionCompiler,
    /// Number of documents collected before merging.
    candidate_pool: usize,
    /// Maximum snippet length in characters.
    snippet_max_chars: usize,
}

impl SearchExecutor {
    /// Opens an existing index for searching.
    pub fn open(path: &Path, settings: &SearchSettings) -> Result<Self, IndexError> {
        if !path.exists() {
            return Err(IndexError::OpenIndex {
                path: path.to_path_buf(),
                message: "index directory does not exist".to_string(),
            });
        }

        let schema = IndexSchema::new();

        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;
        let index = Index::open(dir).map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;

        let analyzer = build_analyzer_from_name(&settings.stemmer)?;
        index.tokenizers().register(MAGPIE_TOKENIZER, analyzer.clone());

        let reader = index
            .reader()
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;

        let compiler = ExpressionCompiler::new(schema.suggest, analyzer, settings.prefix_match);

        debug!(path = %path.display(), docs = reader.searcher().num_docs(), "opened index");

        Ok(Self {
            reader,
            schema,
            compiler,
            candidate_pool: settings.candidate_pool,
            snippet_max_chars: settings.snippet_max_chars,
        })
    }

    /// Makes the latest commit visible to subsequent searches.
    pub fn reload(&self) -> Result<(), IndexError> {
        self.reader.reload().map_err(|e| IndexError::Write(e.to_string()))
    }

    /// Number of searchable documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}
