//! Match expression lexer.

use std::{iter::Peekable, str::Chars};

use super::error::ExpressionError;

/// A token in the match expression syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of non-operator, non-space characters.
    Word(String),

    /// The `&` operator.
    And,

    /// The `|` operator.
    Or,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,
}

/// Tokenizes a match expression.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the entire input.
    fn tokenize(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, or None at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, ExpressionError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '&' => Token::And,
            '|' => Token::Or,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '!' => {
                return Err(ExpressionError::lex(
                    "negation is not supported",
                    self.position,
                    self.input,
                ));
            }
            _ => return self.read_word(),
        };
        self.advance();
        Ok(Some(token))
    }

    /// Reads a word up to the next space or operator.
    fn read_word(&mut self) -> Result<Option<Token>, ExpressionError> {
        let start = self.position;
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || matches!(ch, '&' | '|' | '(' | ')' | '!') {
                break;
            }
            if self.input[self.position..].starts_with("<->") {
                return Err(ExpressionError::lex(
                    "the followed-by operator <-> is not supported",
                    self.position,
                    self.input,
                ));
            }
            self.advance();
        }
        Ok(Some(Token::Word(self.input[start..self.position].to_string())))
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Splits a match expression into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    Lexer::new(input).tokenize()
}
