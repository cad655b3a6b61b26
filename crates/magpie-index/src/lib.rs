//! Tantivy-based location search index for magpie.
//!
//! This crate handles:
//! - Loading feature records into the index ([`IndexWriter`], [`read_jsonl`])
//! - Compiling boolean match expressions into Tantivy queries
//! - Ranked search restricted to exact collection versions ([`SearchExecutor`])
//! - Bounding box reprojection into the caller's CRS ([`Srid`])
//! - Deadline and cancellation enforcement ([`Deadline`], [`CancelFlag`])
//!
//! # Example
//!
//! ```no_run
//! use std::{path::Path, time::Duration};
//!
//! use magpie_config::SearchSettings;
//! use magpie_index::{CancelFlag, CollectionRef, Deadline, SearchExecutor, Srid};
//!
//! let executor = SearchExecutor::open(Path::new("./index"), &SearchSettings::default()).unwrap();
//! let deadline = Deadline::new(Duration::from_secs(5), CancelFlag::new());
//! let rows = executor
//!     .search(
//!         "(spui & 1 & gravenhage)",
//!         &[CollectionRef::new("addresses", 1)],
//!         10,
//!         Srid::Wgs84,
//!         &deadline,
//!     )
//!     .unwrap();
//! for row in rows {
//!     println!("{} ({})", row.display_name, row.rank);
//! }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod compile;
mod crs;
mod deadline;
mod document;
mod error;
mod schema;
mod search;
mod writer;

pub use analyzer::{MAGPIE_TOKENIZER, build_analyzer, build_analyzer_from_name, parse_language};
pub use compile::ExpressionCompiler;
pub use crs::{BBox, EPSG_URI_PREFIX, Srid};
pub use deadline::{CancelFlag, Deadline, DeadlineCollector};
pub use document::{FeatureDocument, read_jsonl};
pub use error::{IndexError, SearchError};
pub use schema::IndexSchema;
pub use search::{CollectionRef, SearchExecutor, SearchResult, merge_rows};
pub use writer::IndexWriter;
