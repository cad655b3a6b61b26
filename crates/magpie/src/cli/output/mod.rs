//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL_CONDENSED};
use magpie::SuggestError;
use magpie_index::{BBox, SearchResult, Srid};
use magpie_query::SearchQuery;
use serde::Serialize;

/// JSON output for `magpie suggest`.
#[derive(Serialize)]
struct JsonSuggestOutput<'a> {
    /// The normalised search text.
    query: &'a str,
    /// The match expression that was searched.
    expression: &'a str,
    /// URI of the CRS the bounding boxes are in.
    crs: String,
    /// Number of rows returned.
    total_matches: usize,
    /// The rows.
    results: &'a [SearchResult],
}

/// One token in `magpie expand --json`.
#[derive(Serialize)]
struct JsonToken<'a> {
    /// The token after rewriting.
    token: &'a str,
    /// Its variants, the token first.
    variants: &'a [String],
}

/// JSON output for `magpie expand`.
#[derive(Serialize)]
struct JsonExpandOutput<'a> {
    /// The raw search text.
    query: &'a str,
    /// The rendered match expression.
    expression: &'a str,
    /// Per-token variants.
    tokens: Vec<JsonToken<'a>>,
}

/// Prints an error for the user and returns the failure exit code.
///
/// Validation problems are printed one per line.
pub fn report_error(err: &SuggestError) -> ExitCode {
    match err {
        SuggestError::Validation(validation) => {
            for message in validation.messages() {
                eprintln!("error: {message}");
            }
        }
        other => eprintln!("error: {other}"),
    }
    ExitCode::FAILURE
}

/// Pretty-prints `value` as JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Formats a bounding box with precision suited to its units.
fn format_bbox(bbox: &BBox, srid: Srid) -> String {
    let precision = if srid == Srid::Wgs84 { 6 } else { 2 };
    format!(
        "{:.p$}, {:.p$}, {:.p$}, {:.p$}",
        bbox.min_x,
        bbox.min_y,
        bbox.max_x,
        bbox.max_y,
        p = precision
    )
}

/// Prints suggest results as a table or JSON.
pub fn output_results(
    rows: &[SearchResult],
    query: &str,
    expression: &str,
    srid: Srid,
    json: bool,
) -> ExitCode {
    if json {
        return print_json(&JsonSuggestOutput {
            query,
            expression,
            crs: srid.uri(),
            total_matches: rows.len(),
            results: rows,
        });
    }

    if rows.is_empty() {
        println!("No matches.");
        return ExitCode::SUCCESS;
    }

    let bbox_header = format!("BBox ({srid})");
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        "#",
        "Name",
        "Collection",
        "Feature",
        "Type",
        "Rank",
        bbox_header.as_str(),
    ]);
    for (i, row) in rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&row.display_name),
            Cell::new(format!("{} v{}", row.collection_id, row.collection_version)),
            Cell::new(&row.feature_id),
            Cell::new(&row.geometry_type),
            Cell::new(format!("{:.3}", row.rank)).set_alignment(CellAlignment::Right),
            Cell::new(format_bbox(&row.bbox, srid)),
        ]);
    }
    println!("{table}");
    ExitCode::SUCCESS
}

/// Prints an expanded query: the expression, or with `json` the token variants too.
pub fn output_expansion(
    query: &str,
    expanded: &SearchQuery,
    expression: &str,
    json: bool,
) -> ExitCode {
    if json {
        return print_json(&JsonExpandOutput {
            query,
            expression,
            tokens: expanded
                .tokens()
                .iter()
                .map(|t| JsonToken {
                    token: t.token(),
                    variants: t.variants(),
                })
                .collect(),
        });
    }
    println!("{expression}");
    ExitCode::SUCCESS
}
