//! Index schema for feature documents.
//!
//! - `feature_id`: feature identifier within its collection (raw, stored)
//! - `collection_id`: collection name (raw, stored, fast)
//! - `collection_version`: collection version (u64, indexed, stored, fast)
//! - `display_name`: label shown to users (stored only)
//! - `suggest`: the searchable text (analyzed with positions, stored)
//! - `geometry_type`: e.g. `Point` or `Polygon` (raw, stored)
//! - `bbox_*`: WGS84 bounding box in lon/lat (f64, indexed, stored, fast)

use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing,
    TextOptions,
};

use crate::analyzer::MAGPIE_TOKENIZER;

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Feature identifier.
    pub feature_id: Field,
    /// Collection name.
    pub collection_id: Field,
    /// Collection version.
    pub collection_version: Field,
    /// Display name.
    pub display_name: Field,
    /// Searchable suggest text.
    pub suggest: Field,
    /// Geometry type.
    pub geometry_type: Field,
    /// Bounding box minimum longitude.
    pub bbox_min_x: Field,
    /// Bounding box minimum latitude.
    pub bbox_min_y: Field,
    /// Bounding box maximum longitude.
    pub bbox_max_x: Field,
    /// Bounding box maximum latitude.
    pub bbox_max_y: Field,
}

impl IndexSchema {
    /// Creates the schema.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let feature_id = builder.add_text_field("feature_id", STRING | STORED);
        let collection_id = builder.add_text_field("collection_id", STRING | STORED | FAST);
        let collection_version =
            builder.add_u64_field("collection_version", INDEXED | STORED | FAST);
        let display_name = builder.add_text_field("display_name", STORED);

        let suggest_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(MAGPIE_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();
        let suggest = builder.add_text_field("suggest", suggest_options);

        let geometry_type = builder.add_text_field("geometry_type", STRING | STORED);
        let bbox_min_x = builder.add_f64_field("bbox_min_x", INDEXED | STORED | FAST);
        let bbox_min_y = builder.add_f64_field("bbox_min_y", INDEXED | STORED | FAST);
        let bbox_max_x = builder.add_f64_field("bbox_max_x", INDEXED | STORED | FAST);
        let bbox_max_y = builder.add_f64_field("bbox_max_y", INDEXED | STORED | FAST);

        Self {
            schema: builder.build(),
            feature_id,
            collection_id,
            collection_version,
            display_name,
            suggest,
            geometry_type,
            bbox_min_x,
            bbox_min_y,
            bbox_max_x,
            bbox_max_y,
        }
    }

    /// Returns a reference to the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use tantivy::schema::FieldType;

    use super::*;

    #[test]
    fn suggest_uses_magpie_analyzer() {
        let schema = IndexSchema::new();
        let entry = schema.schema().get_field_entry(schema.suggest);
        assert!(entry.is_indexed());
        assert!(entry.is_stored());
        match entry.field_type() {
            FieldType::Str(opts) => {
                let indexing = opts.get_indexing_options().unwrap();
                assert_eq!(indexing.tokenizer(), MAGPIE_TOKENIZER);
                assert_eq!(
                    indexing.index_option(),
                    IndexRecordOption::WithFreqsAndPositions
                );
            }
            _ => panic!("suggest should be a text field"),
        }
    }

    #[test]
    fn collection_fields_are_filterable() {
        let schema = IndexSchema::new();
        for field in [schema.collection_id, schema.collection_version] {
            let entry = schema.schema().get_field_entry(field);
            assert!(entry.is_indexed(), "{} should be indexed", entry.name());
            assert!(entry.is_fast(), "{} should be fast", entry.name());
            assert!(entry.is_stored(), "{} should be stored", entry.name());
        }
        assert!(matches!(
            schema
                .schema()
                .get_field_entry(schema.collection_version)
                .field_type(),
            FieldType::U64(_)
        ));
    }

    #[test]
    fn display_name_is_stored_only() {
        let schema = IndexSchema::new();
        let entry = schema.schema().get_field_entry(schema.display_name);
        assert!(entry.is_stored());
        assert!(!entry.is_indexed());
    }

    #[test]
    fn bbox_fields_support_range_filters() {
        let schema = IndexSchema::new();
        for field in [
            schema.bbox_min_x,
            schema.bbox_min_y,
            schema.bbox_max_x,
            schema.bbox_max_y,
        ] {
            let entry = schema.schema().get_field_entry(field);
            assert!(entry.is_stored(), "{} should be stored", entry.name());
            assert!(entry.is_indexed(), "{} should be indexed", entry.name());
            assert!(entry.is_fast(), "{} should be fast", entry.name());
        }
    }
}
