//! Feature records as stored in the index.

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::{IndexError, crs::BBox};

/// A searchable feature, one per indexed row.
///
/// Records are read as JSON lines, e.g.
/// `{"feature_id":"1","collection_id":"addresses","collection_version":1,...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDocument {
    /// Feature identifier within its collection.
    pub feature_id: String,
    /// Collection the feature belongs to.
    pub collection_id: String,
    /// Version of the collection; a new version is a full re-index.
    pub collection_version: u64,
    /// Label shown to users.
    pub display_name: String,
    /// Text matched against queries.
    pub suggest: String,
    /// Geometry type of the underlying feature.
    pub geometry_type: String,
    /// Bounding box in WGS84 lon/lat.
    pub bbox: BBox,
}

/// Reads feature records from JSON lines. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<FeatureDocument>, IndexError> {
    let mut docs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc = serde_json::from_str(&line).map_err(|e| IndexError::ParseDocument {
            line: index + 1,
            message: e.to_string(),
        })?;
        docs.push(doc);
    }
    Ok(docs)
}
