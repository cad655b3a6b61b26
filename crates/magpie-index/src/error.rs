//! Error types for the magpie-index crate.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors that can occur when opening or writing the search index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Path to the index directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// A feature record could not be decoded.
    #[error("invalid feature record on line {line}: {message}")]
    ParseDocument {
        /// 1-based line number in the input.
        line: usize,
        /// Decoder message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid stemmer language.
    #[error("unsupported stemmer language: {0}")]
    InvalidLanguage(String),
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub fn open_index(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `Write` error from a Tantivy error.
    pub fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }
}

/// Errors from a single search call.
///
/// A failed search never yields partial results.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request cannot be executed as given.
    #[error("{0}")]
    Validation(String),

    /// The index failed while searching or loading rows.
    #[error("search index failure: {0}")]
    Datastore(String),

    /// The deadline passed before the search completed.
    #[error("search exceeded its deadline of {} ms", timeout.as_millis())]
    Timeout {
        /// The deadline the search ran under.
        timeout: Duration,
    },

    /// The caller cancelled the search.
    #[error("search was cancelled")]
    Cancelled,
}
