//! Deduplication and final ordering of search rows.

use std::{cmp::Ordering, collections::HashMap};

use super::SearchResult;

/// Collapses duplicate rows and returns at most `limit`, best first.
///
/// Rows are duplicates when display name, collection, version and feature id
/// all match; the highest rank wins. Ordering is rank descending, then display
/// name ascending, then collection, version and feature id so the result is
/// fully deterministic.
pub fn merge_rows(rows: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    let mut best: HashMap<(String, String, u64, String), SearchResult> = HashMap::new();
    for row in rows {
        let key = (
            row.display_name.clone(),
            row.collection_id.clone(),
            row.collection_version,
            row.feature_id.clone(),
        );
        match best.get(&key) {
            Some(existing) if existing.rank >= row.rank => {}
            _ => {
                best.insert(key, row);
            }
        }
    }

    let mut merged: Vec<SearchResult> = best.into_values().collect();
    merged.sort_by(compare);
    merged.truncate(limit);
    merged
}

/// Final result ordering.
fn compare(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.rank
        .partial_cmp(&a.rank)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.collection_id.cmp(&b.collection_id))
        .then_with(|| a.collection_version.cmp(&b.collection_version))
        .then_with(|| a.feature_id.cmp(&b.feature_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::BBox;

    fn row(name: &str, collection: &str, id: &str, rank: f32) -> SearchResult {
        SearchResult {
            display_name: name.to_string(),
            feature_id: id.to_string(),
            collection_id: collection.to_string(),
            collection_version: 1,
            geometry_type: "Point".to_string(),
            bbox: BBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            },
            rank,
            highlight: name.to_string(),
        }
    }

    #[test]
    fn duplicates_keep_highest_rank() {
        let merged = merge_rows(
            vec![
                row("Spui 1", "addresses", "1", 0.5),
                row("Spui 1", "addresses", "1", 2.0),
                row("Spui 1", "addresses", "1", 1.0),
            ],
            10,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rank, 2.0);
    }

    #[test]
    fn same_name_in_other_collection_is_not_a_duplicate() {
        let merged = merge_rows(
            vec![
                row("Spui", "addresses", "1", 1.0),
                row("Spui", "roads", "1", 1.0),
                row("Spui", "addresses", "2", 1.0),
            ],
            10,
        );
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn sorted_by_rank_then_name() {
        let merged = merge_rows(
            vec![
                row("Beta", "a", "1", 1.0),
                row("Alpha", "a", "2", 1.0),
                row("Gamma", "a", "3", 3.0),
            ],
            10,
        );
        let names: Vec<_> = merged.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn truncates_after_merging() {
        let rows = (0..20)
            .map(|i| row(&format!("Street {i:02}"), "a", &i.to_string(), i as f32))
            .collect();
        let merged = merge_rows(rows, 5);
        assert_eq!(merged.len(), 5);
        assert_eq!(merged[0].display_name, "Street 19");
        assert_eq!(merged[4].display_name, "Street 15");
    }

    #[test]
    fn zero_limit_is_empty() {
        assert!(merge_rows(vec![row("a", "a", "1", 1.0)], 0).is_empty());
    }
}
