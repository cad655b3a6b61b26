//! The boolean match expression handed to the search index.
//!
//! The grammar is the one [`BooleanQueryRenderer`](crate::BooleanQueryRenderer)
//! produces:
//!
//! ```text
//! expr    → and_expr ("|" and_expr)*
//! and_expr → primary ("&" primary)*
//! primary → WORD+ | "(" expr ")"
//! ```
//!
//! `&` binds tighter than `|`. Adjacent words without an operator between
//! them form a single multi-word term, which the index matches as a phrase.

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::MatchExpr;
pub use error::ExpressionError;
pub use lexer::{Token, tokenize};
pub use parser::parse_expression;
