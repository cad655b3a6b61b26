//! Query expansion for magpie.
//!
//! Free-text location queries are normalised in three steps:
//!
//! - **Rewrites** replace literal phrases with a canonical form (`den haag`
//!   becomes `gravenhage`).
//! - **Synonyms** expand every token into its alternative spellings
//!   (`1ste`, `eerste`), including substrings inside longer words
//!   (`gouvstraat`, `gouverneurstraat`).
//! - **Rendering** turns the expanded query into a boolean match expression,
//!   an OR over every combination of one variant per token.
//!
//! # Example
//!
//! ```
//! use magpie_query::{BooleanQueryRenderer, QueryExpander, RewriteTable, Rule, SynonymTable};
//!
//! let rewrites = RewriteTable::from_rules([Rule::new("gravenhage", &["den haag"])]);
//! let synonyms = SynonymTable::from_rules([Rule::new("eerste", &["1ste"])]);
//! let expander = QueryExpander::new(rewrites, synonyms, 1024);
//!
//! let query = expander.expand("Eerste Laan den Haag");
//! assert_eq!(
//!     BooleanQueryRenderer::render(&query),
//!     "(1ste & laan & gravenhage) | (eerste & laan & gravenhage)"
//! );
//! ```

#![warn(missing_docs)]

mod dictionary;
mod expand;
mod expression;
mod render;
mod rewrite;
mod search_query;
mod synonyms;

pub use dictionary::{Rule, parse_rules, read_rules};
pub use expand::{Expansion, QueryExpander, expand_variants, sanitize};
pub use expression::{ExpressionError, MatchExpr, Token, parse_expression, tokenize};
pub use render::BooleanQueryRenderer;
pub use rewrite::RewriteTable;
pub use search_query::{SearchQuery, TokenVariants};
pub use synonyms::SynonymTable;
