//! Recursive descent parser for match expressions.

use std::mem;

use super::{
    ast::MatchExpr,
    error::ExpressionError,
    lexer::{Token, tokenize},
};

/// Recursive descent parser over a token stream.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in token stream.
    position: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses the whole token stream.
    fn parse(mut self) -> Result<Option<MatchExpr>, ExpressionError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let expr = self.parse_or_expr()?;

        if let Some(token) = self.peek() {
            return Err(ExpressionError::parse(
                format!("unexpected token: {token:?}"),
                self.position,
            ));
        }

        Ok(Some(expr))
    }

    /// Parses: expr → and_expr ("|" and_expr)*
    fn parse_or_expr(&mut self) -> Result<MatchExpr, ExpressionError> {
        let mut exprs = vec![self.parse_and_expr()?];
        while self.check(&Token::Or) {
            self.advance();
            exprs.push(self.parse_and_expr()?);
        }
        Ok(MatchExpr::or(exprs))
    }

    /// Parses: and_expr → primary ("&" primary)*
    fn parse_and_expr(&mut self) -> Result<MatchExpr, ExpressionError> {
        let mut exprs = vec![self.parse_primary()?];
        while self.check(&Token::And) {
            self.advance();
            exprs.push(self.parse_primary()?);
        }
        Ok(MatchExpr::and(exprs))
    }

    /// Parses: primary → WORD+ | "(" expr ")"
    fn parse_primary(&mut self) -> Result<MatchExpr, ExpressionError> {
        match self.peek().cloned() {
            Some(Token::Word(_)) => Ok(self.parse_term()),
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_or_expr()?;
                if !self.check(&Token::RParen) {
                    return Err(ExpressionError::parse(
                        "expected closing parenthesis",
                        self.position,
                    ));
                }
                self.advance();
                Ok(inner)
            }
            Some(Token::RParen) => Err(ExpressionError::parse(
                "unexpected closing parenthesis",
                self.position,
            )),
            Some(Token::And | Token::Or) => Err(ExpressionError::parse(
                "operator needs an expression before it",
                self.position,
            )),
            None => Err(ExpressionError::parse(
                "unexpected end of expression",
                self.position,
            )),
        }
    }

    /// Joins consecutive words into one term.
    fn parse_term(&mut self) -> MatchExpr {
        let mut words = Vec::new();
        while let Some(Token::Word(word)) = self.peek() {
            words.push(word.clone());
            self.advance();
        }
        MatchExpr::Term(words.join(" "))
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Checks if the current token has the same kind as `token`.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a match expression.
///
/// Returns `Ok(None)` for blank input.
pub fn parse_expression(input: &str) -> Result<Option<MatchExpr>, ExpressionError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> MatchExpr {
        MatchExpr::Term(s.into())
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(parse_expression("").unwrap(), None);
        assert_eq!(parse_expression("  ").unwrap(), None);
    }

    #[test]
    fn single_group() {
        assert_eq!(parse_expression("(foobar)").unwrap(), Some(term("foobar")));
    }

    #[test]
    fn conjunction() {
        assert_eq!(
            parse_expression("(spui & 1 & gravenhage)").unwrap(),
            Some(MatchExpr::And(vec![term("spui"), term("1"), term("gravenhage")]))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse_expression("a & b | c").unwrap(),
            Some(MatchExpr::Or(vec![
                MatchExpr::And(vec![term("a"), term("b")]),
                term("c"),
            ]))
        );
    }

    #[test]
    fn adjacent_words_form_one_term() {
        assert_eq!(
            parse_expression("(den haag & 1)").unwrap(),
            Some(MatchExpr::And(vec![term("den haag"), term("1")]))
        );
    }

    #[test]
    fn display_round_trips_rendered_form() {
        let input = "(1ste & 2de) | (1ste & tweede) | (eerste & 2de) | (eerste & tweede)";
        let expr = parse_expression(input).unwrap().unwrap();
        assert_eq!(expr.to_string(), input);
    }

    #[test]
    fn unclosed_group() {
        let err = parse_expression("(a & b").unwrap_err();
        assert_eq!(err.message(), "expected closing parenthesis");
    }

    #[test]
    fn dangling_operator() {
        assert!(parse_expression("a &").is_err());
        assert!(parse_expression("| a").is_err());
        assert!(parse_expression("a & | b").is_err());
    }

    #[test]
    fn stray_closing_paren() {
        let err = parse_expression("a)").unwrap_err();
        assert!(err.message().contains("unexpected token"));
    }
}
