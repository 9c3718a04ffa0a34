//! Expression tokenizer
//!
//! The lexer itself is stateless: every call takes the cursor explicitly, so
//! the parser can save a [`Cursor`] and restore it to un-read a token.

use std::fmt;

/// Byte offset into the expression source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub usize);

/// Characters allowed after the closing `/` of a regex literal.
const REGEX_FLAG_CHARS: &[char] = &['i', 'm', 's', 'u'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Not,
    And,
    Or,
    Identifier(String),
    /// Quoted string, quotes stripped and escapes resolved
    String(String),
    /// `/pattern/flags`, escapes kept verbatim in `pattern`
    Regex { pattern: String, flags: String },
    /// Identifier immediately followed by a comparison operator, e.g. `title^=i`
    Operator { variable: String, op: String },
    Unknown(char),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::Not => f.write_str("'!'"),
            Self::And => f.write_str("'&'"),
            Self::Or => f.write_str("'|'"),
            Self::Identifier(name) => write!(f, "identifier `{name}`"),
            Self::String(value) => write!(f, "string {value:?}"),
            Self::Regex { pattern, flags } => write!(f, "regex /{pattern}/{flags}"),
            Self::Operator { variable, op } => write!(f, "operator `{variable}{op}`"),
            Self::Unknown(ch) => write!(f, "character {ch:?}"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Offset of the first character of the token
    pub position: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    #[inline]
    fn peek(&self, cursor: Cursor) -> Option<char> {
        self.input.get(cursor.0..).and_then(|rest| rest.chars().next())
    }

    #[inline]
    fn peek_at(&self, cursor: Cursor, skip: usize) -> Option<char> {
        self.input.get(cursor.0..).and_then(|rest| rest.chars().nth(skip))
    }

    #[inline]
    fn bump(&self, cursor: &mut Cursor) -> Option<char> {
        let ch = self.peek(*cursor)?;
        cursor.0 += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&self, cursor: &mut Cursor) {
        while self.peek(*cursor).is_some_and(char::is_whitespace) {
            self.bump(cursor);
        }
    }

    /// Read the token at `cursor` and advance past it.
    pub fn next_token(&self, cursor: &mut Cursor) -> Token {
        self.skip_whitespace(cursor);
        let position = cursor.0;

        let Some(ch) = self.peek(*cursor) else {
            return Token { kind: TokenKind::Eof, position };
        };

        let kind = match ch {
            '(' => {
                self.bump(cursor);
                TokenKind::LParen
            }
            ')' => {
                self.bump(cursor);
                TokenKind::RParen
            }
            '!' => {
                self.bump(cursor);
                TokenKind::Not
            }
            '&' => {
                self.bump(cursor);
                TokenKind::And
            }
            '|' => {
                self.bump(cursor);
                TokenKind::Or
            }
            '"' | '\'' => self.read_string(cursor),
            '/' => self.read_regex(cursor),
            c if is_identifier_start(c) => self.read_identifier_or_operator(cursor),
            other => {
                self.bump(cursor);
                TokenKind::Unknown(other)
            }
        };

        Token { kind, position }
    }

    fn read_string(&self, cursor: &mut Cursor) -> TokenKind {
        let quote = self.bump(cursor);
        let mut value = String::new();

        // An unterminated string runs to the end of the input.
        while let Some(ch) = self.bump(cursor) {
            if Some(ch) == quote {
                break;
            }
            if ch == '\\' {
                if let Some(escaped) = self.bump(cursor) {
                    value.push(escaped);
                }
            } else {
                value.push(ch);
            }
        }

        TokenKind::String(value)
    }

    fn read_regex(&self, cursor: &mut Cursor) -> TokenKind {
        self.bump(cursor);
        let mut pattern = String::new();

        while let Some(ch) = self.peek(*cursor) {
            if ch == '/' {
                self.bump(cursor);
                break;
            }
            self.bump(cursor);
            pattern.push(ch);
            if ch == '\\' {
                if let Some(escaped) = self.bump(cursor) {
                    pattern.push(escaped);
                }
            }
        }

        let mut flags = String::new();
        while let Some(flag) = self.peek(*cursor).filter(|c| REGEX_FLAG_CHARS.contains(c)) {
            self.bump(cursor);
            flags.push(flag);
        }

        TokenKind::Regex { pattern, flags }
    }

    fn read_identifier_or_operator(&self, cursor: &mut Cursor) -> TokenKind {
        let start = cursor.0;
        self.bump(cursor);
        while self.peek(*cursor).is_some_and(is_identifier_char) {
            self.bump(cursor);
        }
        let variable = self.input[start..cursor.0].to_string();

        self.skip_whitespace(cursor);

        let mut op = String::new();
        match self.peek(*cursor) {
            Some(c @ ('^' | '$' | '*')) if self.peek_at(*cursor, 1) == Some('=') => {
                self.bump(cursor);
                self.bump(cursor);
                op.push(c);
                op.push('=');
                if let Some(suffix) = self.peek(*cursor).filter(|c| matches!(c, 'i' | 'I')) {
                    self.bump(cursor);
                    op.push(suffix);
                }
            }
            Some('=') => {
                self.bump(cursor);
                op.push('=');
                if let Some(suffix) = self.peek(*cursor).filter(|c| matches!(c, '~' | 'i' | 'I')) {
                    self.bump(cursor);
                    op.push(suffix);
                }
            }
            _ => {}
        }

        if op.is_empty() {
            TokenKind::Identifier(variable)
        } else {
            TokenKind::Operator { variable, op }
        }
    }
}

#[inline]
fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

#[inline]
fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
