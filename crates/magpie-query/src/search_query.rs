//! The expanded form of a user query.

/// One distinct query token and its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVariants {
    /// The token as it appeared after rewriting.
    token: String,
    /// Variants in discovery order; never empty, `token` first.
    variants: Vec<String>,
}

impl TokenVariants {
    /// Creates a variant list for `token`.
    ///
    /// `token` is always placed first and duplicates are dropped, so the list
    /// is never empty.
    pub fn new(token: &str, variants: impl IntoIterator<Item = String>) -> Self {
        let mut list = vec![token.to_string()];
        for variant in variants {
            if !list.contains(&variant) {
                list.push(variant);
            }
        }
        Self {
            token: token.to_string(),
            variants: list,
        }
    }

    /// The original token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Variants in discovery order.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Variants in byte-lexicographic order.
    pub fn sorted_variants(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.variants.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }
}

/// An expanded query: distinct tokens in first-seen order, each with its
/// variants. Built once per request and never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Tokens in first-seen order.
    tokens: Vec<TokenVariants>,
}

impl SearchQuery {
    /// Creates a query from token variant lists.
    pub fn new(tokens: Vec<TokenVariants>) -> Self {
        Self { tokens }
    }

    /// Tokens in first-seen order.
    pub fn tokens(&self) -> &[TokenVariants] {
        &self.tokens
    }

    /// Variants for `token`, if it is part of the query.
    pub fn variants(&self, token: &str) -> Option<&[String]> {
        self.tokens
            .iter()
            .find(|t| t.token == token)
            .map(TokenVariants::variants)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True if the query has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of conjunctions the rendered expression will contain.
    pub fn combinations(&self) -> usize {
        if self.tokens.is_empty() {
            return 0;
        }
        self.tokens
            .iter()
            .fold(1usize, |acc, t| acc.saturating_mul(t.variants.len()))
    }
}
