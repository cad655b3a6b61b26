//! magpie: location suggestions over versioned feature collections.
//!
//! A free-text query is expanded through rewrite and synonym dictionaries into
//! a boolean match expression, which is run against a full-text index of
//! features restricted to the requested collections. This crate ties the
//! pieces together: it validates raw request parameters into
//! [`SuggestParams`] and runs them through a [`SuggestService`] built once
//! from configuration.

#![warn(missing_docs)]

pub mod request;
pub mod service;

pub use request::{CRS_URI_PREFIX, SuggestParams, ValidationError};
pub use service::{SuggestError, SuggestService, Suggestion};
