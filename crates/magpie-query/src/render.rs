//! Rendering a [`SearchQuery`] as a boolean match expression.

use crate::search_query::SearchQuery;

/// Renders queries as an OR of ANDs.
///
/// Every combination of one variant per token becomes a parenthesised
/// conjunction such as `(eerste & 2de)`; combinations are joined with `|`.
/// Tokens keep their first-seen order. Each token's variants are taken in
/// byte-lexicographic order and the first token varies slowest, so the output
/// does not depend on dictionary order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanQueryRenderer;

impl BooleanQueryRenderer {
    /// Renders `query`. An empty query renders as an empty string.
    pub fn render(query: &SearchQuery) -> String {
        if query.is_empty() {
            return String::new();
        }

        let lists: Vec<Vec<&str>> = query
            .tokens()
            .iter()
            .map(|t| t.sorted_variants())
            .collect();
        let mut indices = vec![0usize; lists.len()];
        let mut conjunctions = Vec::new();

        loop {
            let terms: Vec<&str> = lists
                .iter()
                .zip(&indices)
                .map(|(list, &i)| list[i])
                .collect();
            conjunctions.push(format!("({})", terms.join(" & ")));

            // Advance the odometer, last token fastest.
            let mut slot = lists.len();
            loop {
                if slot == 0 {
                    return conjunctions.join(" | ");
                }
                slot -= 1;
                indices[slot] += 1;
                if indices[slot] < lists[slot].len() {
                    break;
                }
                indices[slot] = 0;
            }
        }
    }
}
