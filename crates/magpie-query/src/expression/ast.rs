//! Match expression syntax tree.

use std::fmt;

/// A parsed match expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchExpr {
    /// A term; may hold several space-separated words.
    Term(String),

    /// All sub-expressions must match.
    And(Vec<Self>),

    /// At least one sub-expression must match.
    Or(Vec<Self>),
}

impl MatchExpr {
    /// Creates an And expression, flattening nested Ands.
    pub fn and(exprs: Vec<Self>) -> Self {
        Self::flatten(exprs, Self::And, |e| match e {
            Self::And(inner) => Ok(inner),
            other => Err(other),
        })
    }

    /// Creates an Or expression, flattening nested Ors.
    pub fn or(exprs: Vec<Self>) -> Self {
        Self::flatten(exprs, Self::Or, |e| match e {
            Self::Or(inner) => Ok(inner),
            other => Err(other),
        })
    }

    /// Splices children of the same kind into the parent and unwraps a
    /// single remaining child.
    fn flatten(
        exprs: Vec<Self>,
        build: fn(Vec<Self>) -> Self,
        same_kind: fn(Self) -> Result<Vec<Self>, Self>,
    ) -> Self {
        let mut flattened = Vec::with_capacity(exprs.len());
        for expr in exprs {
            match same_kind(expr) {
                Ok(inner) => flattened.extend(inner),
                Err(other) => flattened.push(other),
            }
        }
        if flattened.len() == 1
            && let Some(only) = flattened.pop()
        {
            return only;
        }
        build(flattened)
    }

    /// Collects every term in the expression, left to right.
    pub fn terms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    /// Helper for [`Self::terms`].
    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Term(t) => out.push(t),
            Self::And(exprs) | Self::Or(exprs) => {
                for expr in exprs {
                    expr.collect_terms(out);
                }
            }
        }
    }

    /// Writes a child, parenthesised when it is a compound expression.
    fn fmt_child(child: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match child {
            Self::Term(t) => write!(f, "{t}"),
            compound => write!(f, "({compound})"),
        }
    }

    /// Writes `exprs` separated by `op`.
    fn fmt_joined(exprs: &[Self], op: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                write!(f, " {op} ")?;
            }
            Self::fmt_child(expr, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for MatchExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(t) => write!(f, "{t}"),
            Self::And(exprs) => Self::fmt_joined(exprs, "&", f),
            Self::Or(exprs) => Self::fmt_joined(exprs, "|", f),
        }
    }
}
