//! Errors from lexing and parsing match expressions.

use thiserror::Error;

/// A malformed match expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The input contains a character sequence the lexer does not accept.
    #[error("expression syntax error at byte {position}: {message}")]
    Lex {
        /// Error message.
        message: String,
        /// Byte position in the input.
        position: usize,
        /// The original input.
        input: String,
    },

    /// The token stream does not form a valid expression.
    #[error("expression syntax error at token {token_index}: {message}")]
    Parse {
        /// Error message.
        message: String,
        /// Index of the offending token (the token count at end of input).
        token_index: usize,
    },
}

impl ExpressionError {
    /// Creates a lexer error.
    pub fn lex(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self::Lex {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }

    /// Creates a parser error.
    pub fn parse(message: impl Into<String>, token_index: usize) -> Self {
        Self::Parse {
            message: message.into(),
            token_index,
        }
    }

    /// The error message without position information.
    pub fn message(&self) -> &str {
        match self {
            Self::Lex { message, .. } | Self::Parse { message, .. } => message,
        }
    }

    /// Formats a lexer error with the input and a caret under the offending byte.
    pub fn format_with_context(&self) -> String {
        match self {
            Self::Lex {
                message,
                position,
                input,
            } => format!(
                "expression syntax error: {message}\n  {input}\n  {}^",
                " ".repeat((*position).min(input.len()))
            ),
            Self::Parse { .. } => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_context() {
        let err = ExpressionError::lex("negation is not supported", 4, "a & !b");
        let text = err.format_with_context();
        assert!(text.contains("negation is not supported"));
        assert!(text.contains("a & !b"));
        assert!(text.ends_with("    ^"));
    }

    #[test]
    fn parse_error_display() {
        let err = ExpressionError::parse("expected closing parenthesis", 3);
        assert_eq!(
            err.to_string(),
            "expression syntax error at token 3: expected closing parenthesis"
        );
        assert_eq!(err.message(), "expected closing parenthesis");
    }
}
