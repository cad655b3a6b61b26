//! Index writer for loading feature documents.

use std::{fs, path::Path};

use tantivy::{
    Index, IndexWriter as TantivyIndexWriter, TantivyDocument, Term,
    directory::MmapDirectory,
    query::{BooleanQuery, Occur, Query, TermQuery},
    schema::IndexRecordOption,
};
use tracing::debug;

use crate::{
    analyzer::{MAGPIE_TOKENIZER, build_analyzer_from_name},
    document::FeatureDocument,
    error::IndexError,
    schema::IndexSchema,
};

/// Default heap size for the index writer (50 MB).
const DEFAULT_HEAP_SIZE: usize = 50_000_000;

/// Writes feature documents to a Tantivy index.
pub struct IndexWriter {
    /// The Tantivy index.
    index: Index,
    /// The underlying Tantivy writer.
    writer: TantivyIndexWriter,
    /// Schema with field handles.
    schema: IndexSchema,
}

impl IndexWriter {
    /// Opens or creates an index at `path`, analysing text with the `language` stemmer.
    pub fn open(path: &Path, language: &str) -> Result<Self, IndexError> {
        let schema = IndexSchema::new();
        let analyzer = build_analyzer_from_name(language)?;

        fs::create_dir_all(path)?;

        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;

        let index = Index::open_or_create(dir, schema.schema().clone())
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;
        index.tokenizers().register(MAGPIE_TOKENIZER, analyzer);

        let writer = index
            .writer(DEFAULT_HEAP_SIZE)
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;

        Ok(Self {
            index,
            writer,
            schema,
        })
    }

    /// Stages a feature document; it becomes visible after [`Self::commit`].
    pub fn add_document(&mut self, doc: &FeatureDocument) -> Result<(), IndexError> {
        let mut tantivy_doc = TantivyDocument::new();
        tantivy_doc.add_text(self.schema.feature_id, &doc.feature_id);
        tantivy_doc.add_text(self.schema.collection_id, &doc.collection_id);
        tantivy_doc.add_u64(self.schema.collection_version, doc.collection_version);
        tantivy_doc.add_text(self.schema.display_name, &doc.display_name);
        tantivy_doc.add_text(self.schema.suggest, &doc.suggest);
        tantivy_doc.add_text(self.schema.geometry_type, &doc.geometry_type);
        tantivy_doc.add_f64(self.schema.bbox_min_x, doc.bbox.min_x);
        tantivy_doc.add_f64(self.schema.bbox_min_y, doc.bbox.min_y);
        tantivy_doc.add_f64(self.schema.bbox_max_x, doc.bbox.max_x);
        tantivy_doc.add_f64(self.schema.bbox_max_y, doc.bbox.max_y);

        self.writer
            .add_document(tantivy_doc)
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Stages several feature documents.
    pub fn add_documents(&mut self, docs: &[FeatureDocument]) -> Result<(), IndexError> {
        for doc in docs {
            self.add_document(doc)?;
        }
        debug!(count = docs.len(), "staged feature documents");
        Ok(())
    }

    /// Deletes every document of one collection version.
    ///
    /// Other versions of the same collection are untouched, so a new version
    /// can be loaded next to the live one and the old one dropped afterwards.
    pub fn delete_collection_version(
        &mut self,
        collection_id: &str,
        version: u64,
    ) -> Result<(), IndexError> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = vec![
            (
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.schema.collection_id, collection_id),
                    IndexRecordOption::Basic,
                )),
            ),
            (
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_u64(self.schema.collection_version, version),
                    IndexRecordOption::Basic,
                )),
            ),
        ];
        self.writer
            .delete_query(Box::new(BooleanQuery::new(clauses)))
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Commits all pending changes to the index.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }

    /// Returns the number of committed documents.
    pub fn num_docs(&self) -> Result<u64, IndexError> {
        let reader = self
            .index
            .reader()
            .map_err(|e| IndexError::Write(e.to_string()))?;
        Ok(reader.searcher().num_docs())
    }
}
