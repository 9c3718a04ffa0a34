//! Recursive-descent condition parser
//!
//! ```text
//! Or      := And ('|' And)*
//! And     := Not ('&' Not)*
//! Not     := '!' Not | Primary
//! Primary := '(' Or ')'
//!          | OPERATOR STRING
//!          | OPERATOR REGEX          (operator must be =~)
//!          | IDENTIFIER REGEX
//!          | REGEX                   (tests `url`)
//! ```
//!
//! Parsing is all-or-nothing. Lookahead is a single token, done by saving
//! the cursor and restoring it.

use super::lexer::{Cursor, Lexer, Token, TokenKind};
use super::{CompareOp, Expression};

/// Why an expression failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,
    #[error("expected {expected} at offset {position}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("unclosed '(' at offset {position}")]
    UnclosedGroup { position: usize },
    #[error("unexpected {found} at offset {position} after a complete expression")]
    TrailingInput { position: usize, found: String },
    #[error("unrecognized character {ch:?} at offset {position}")]
    UnknownCharacter { position: usize, ch: char },
}

type ParseResult = Result<Expression, ExpressionError>;

/// Parse a condition, returning `None` on any structural error.
pub fn parse_expression(input: &str) -> Option<Expression> {
    try_parse_expression(input).ok()
}

/// Parse a condition, reporting where and why it failed.
pub fn try_parse_expression(input: &str) -> ParseResult {
    if input.trim().is_empty() {
        return Err(ExpressionError::Empty);
    }

    let lexer = Lexer::new(input);
    let mut cursor = Cursor::default();
    let expr = parse_or(&lexer, &mut cursor)?;

    let next = lexer.next_token(&mut cursor);
    match next.kind {
        TokenKind::Eof => Ok(expr),
        TokenKind::Unknown(ch) => Err(ExpressionError::UnknownCharacter {
            position: next.position,
            ch,
        }),
        other => Err(ExpressionError::TrailingInput {
            position: next.position,
            found: other.to_string(),
        }),
    }
}

fn parse_or(lexer: &Lexer<'_>, cursor: &mut Cursor) -> ParseResult {
    let mut left = parse_and(lexer, cursor)?;

    loop {
        let saved = *cursor;
        if lexer.next_token(cursor).kind != TokenKind::Or {
            *cursor = saved;
            return Ok(left);
        }
        let right = parse_and(lexer, cursor)?;
        left = Expression::or(left, right);
    }
}

fn parse_and(lexer: &Lexer<'_>, cursor: &mut Cursor) -> ParseResult {
    let mut left = parse_not(lexer, cursor)?;

    loop {
        let saved = *cursor;
        if lexer.next_token(cursor).kind != TokenKind::And {
            *cursor = saved;
            return Ok(left);
        }
        let right = parse_not(lexer, cursor)?;
        left = Expression::and(left, right);
    }
}

fn parse_not(lexer: &Lexer<'_>, cursor: &mut Cursor) -> ParseResult {
    let saved = *cursor;
    if lexer.next_token(cursor).kind == TokenKind::Not {
        return parse_not(lexer, cursor).map(Expression::not);
    }
    *cursor = saved;
    parse_primary(lexer, cursor)
}

fn parse_primary(lexer: &Lexer<'_>, cursor: &mut Cursor) -> ParseResult {
    let token = lexer.next_token(cursor);

    match token.kind {
        TokenKind::LParen => {
            let expr = parse_or(lexer, cursor)?;
            let close = lexer.next_token(cursor);
            match close.kind {
                TokenKind::RParen => Ok(expr),
                TokenKind::Eof => Err(ExpressionError::UnclosedGroup {
                    position: token.position,
                }),
                _ => Err(unexpected(close, "')'")),
            }
        }
        TokenKind::Operator { variable, op } if op == "=~" => {
            let next = lexer.next_token(cursor);
            match next.kind {
                TokenKind::Regex { pattern, flags } => Ok(Expression::regex(variable, pattern, Some(flags.as_str()))),
                _ => Err(unexpected(next, "a regex literal")),
            }
        }
        TokenKind::Operator { variable, op } => {
            // The lexer only ever produces valid comparison operators here.
            let operator = CompareOp::parse(&op).ok_or_else(|| ExpressionError::UnexpectedToken {
                position: token.position,
                expected: "a comparison operator",
                found: format!("`{op}`"),
            })?;
            let next = lexer.next_token(cursor);
            match next.kind {
                TokenKind::String(value) => Ok(Expression::comparison(variable, operator, value)),
                _ => Err(unexpected(next, "a quoted string")),
            }
        }
        TokenKind::Identifier(variable) => {
            let next = lexer.next_token(cursor);
            match next.kind {
                TokenKind::Regex { pattern, flags } => Ok(Expression::regex(variable, pattern, Some(flags.as_str()))),
                _ => Err(unexpected(next, "a regex literal after identifier")),
            }
        }
        TokenKind::Regex { pattern, flags } => Ok(Expression::regex("url", pattern, Some(flags.as_str()))),
        _ => Err(unexpected(token, "a condition")),
    }
}

fn unexpected(token: Token, expected: &'static str) -> ExpressionError {
    match token.kind {
        TokenKind::Unknown(ch) => ExpressionError::UnknownCharacter {
            position: token.position,
            ch,
        },
        kind => ExpressionError::UnexpectedToken {
            position: token.position,
            expected,
            found: kind.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::CompareKind;

    fn cmp(variable: &str, kind: CompareKind, ci: bool, value: &str) -> Expression {
        Expression::comparison(variable, CompareOp::new(kind, ci), value)
    }

    fn eq(variable: &str, value: &str) -> Expression {
        cmp(variable, CompareKind::Equals, false, value)
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(parse_expression(r#"title="test""#), Some(eq("title", "test")));
        assert_eq!(
            parse_expression(r#"title^="prefix""#),
            Some(cmp("title", CompareKind::StartsWith, false, "prefix"))
        );
        assert_eq!(
            parse_expression(r#"title$="suffix""#),
            Some(cmp("title", CompareKind::EndsWith, false, "suffix"))
        );
        assert_eq!(
            parse_expression(r#"title*="middle""#),
            Some(cmp("title", CompareKind::Contains, false, "middle"))
        );
    }

    #[test]
    fn case_insensitive_suffix_is_normalized() {
        let expr = parse_expression(r#"title=i"TEST""#).unwrap();
        assert_eq!(expr, cmp("title", CompareKind::Equals, true, "TEST"));
        match expr {
            Expression::Comparison { operator, .. } => assert_eq!(operator.to_string(), "=i"),
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(
            parse_expression(r#"title*=I"MIDDLE""#),
            Some(cmp("title", CompareKind::Contains, true, "MIDDLE"))
        );
    }

    #[test]
    fn regex_forms() {
        assert_eq!(
            parse_expression("title=~/pattern/i"),
            Some(Expression::regex("title", "pattern", Some("i")))
        );
        assert_eq!(
            parse_expression("url=~/test/"),
            Some(Expression::regex("url", "test", None))
        );
        assert_eq!(
            parse_expression("title /pattern/"),
            Some(Expression::regex("title", "pattern", None))
        );
        assert_eq!(
            parse_expression("/pattern/m"),
            Some(Expression::regex("url", "pattern", Some("m")))
        );
        assert_eq!(
            parse_expression(r"path=~/\.(pdf|doc)$/"),
            Some(Expression::regex("path", r"\.(pdf|doc)$", None))
        );
        assert_eq!(
            parse_expression("url=~/[a-z]+/i"),
            Some(Expression::regex("url", "[a-z]+", Some("i")))
        );
    }

    // With no flags, re-splitting the body `a\/b` at its last `/` would give
    // body `a\` and flags `b`; the regex token keeps the two apart instead.
    #[test]
    fn escaped_slash_stays_in_pattern() {
        assert_eq!(
            parse_expression(r"url=~/a\/b/"),
            Some(Expression::regex("url", r"a\/b", None))
        );
    }

    #[test]
    fn unsupported_regex_flag_is_trailing_input() {
        assert_eq!(parse_expression("/pattern/gi"), None);
    }

    #[test]
    fn logical_operators() {
        assert_eq!(
            parse_expression(r#"!title="test""#),
            Some(Expression::not(eq("title", "test")))
        );
        assert_eq!(
            parse_expression(r#"title="a" & url="b""#),
            Some(Expression::and(eq("title", "a"), eq("url", "b")))
        );
        assert_eq!(
            parse_expression(r#"title="a" | title="b""#),
            Some(Expression::or(eq("title", "a"), eq("title", "b")))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse_expression(r#"a="1" | b="2" & c="3""#),
            Some(Expression::or(eq("a", "1"), Expression::and(eq("b", "2"), eq("c", "3"))))
        );
        assert_eq!(
            parse_expression(r#"a="1" & (b="2" | c="3")"#),
            Some(Expression::and(eq("a", "1"), Expression::or(eq("b", "2"), eq("c", "3"))))
        );
    }

    #[test]
    fn not_binds_tightest() {
        assert_eq!(
            parse_expression(r#"!a="1" & b="2""#),
            Some(Expression::and(Expression::not(eq("a", "1")), eq("b", "2")))
        );
    }

    #[test]
    fn chains_are_left_associative() {
        assert_eq!(
            parse_expression(r#"a="1" | b="2" | c="3""#),
            Some(Expression::or(Expression::or(eq("a", "1"), eq("b", "2")), eq("c", "3")))
        );
    }

    #[test]
    fn parentheses_and_whitespace() {
        assert_eq!(parse_expression(r#"(title="test")"#), Some(eq("title", "test")));
        assert_eq!(parse_expression(r#"  title = "test"  "#), Some(eq("title", "test")));
        assert_eq!(
            parse_expression(r#"title="a"   &   url="b""#),
            Some(Expression::and(eq("title", "a"), eq("url", "b")))
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(parse_expression(r#"title="test\"quote""#), Some(eq("title", "test\"quote")));
        assert_eq!(parse_expression(r"title='test\'quote'"), Some(eq("title", "test'quote")));
    }

    #[test]
    fn variable_names() {
        for name in ["url", "title", "host", "path", "my_var"] {
            assert_eq!(parse_expression(&format!("{name}=\"test\"")), Some(eq(name, "test")));
        }
    }

    #[test]
    fn invalid_expressions() {
        assert_eq!(parse_expression("title=test"), None);
        assert_eq!(parse_expression(r#"(title="test""#), None);
        assert_eq!(parse_expression(r#"title="test")"#), None);
        assert_eq!(parse_expression("title=~test"), None);
        assert_eq!(parse_expression(""), None);
        assert_eq!(parse_expression("&"), None);
        assert_eq!(parse_expression("|"), None);
        assert_eq!(parse_expression("title"), None);
        assert_eq!(parse_expression(r#"title=~"str""#), None);
        assert_eq!(parse_expression(r#"a="1" &"#), None);
        assert_eq!(parse_expression(r#"a="1" b="2""#), None);
    }

    #[test]
    fn unknown_character_fails_whole_parse() {
        assert_eq!(
            try_parse_expression(r#"title="a" @"#),
            Err(ExpressionError::UnknownCharacter { position: 10, ch: '@' })
        );
        assert_eq!(
            try_parse_expression(r#"# title="a""#),
            Err(ExpressionError::UnknownCharacter { position: 0, ch: '#' })
        );
    }

    #[test]
    fn error_details() {
        assert_eq!(try_parse_expression("   "), Err(ExpressionError::Empty));
        assert_eq!(
            try_parse_expression(r#"(title="test""#),
            Err(ExpressionError::UnclosedGroup { position: 0 })
        );
        assert!(matches!(
            try_parse_expression(r#"title="test")"#),
            Err(ExpressionError::TrailingInput { position: 12, .. })
        ));
        assert!(matches!(
            try_parse_expression("title=test"),
            Err(ExpressionError::UnexpectedToken { position: 6, expected: "a quoted string", .. })
        ));
    }
}
