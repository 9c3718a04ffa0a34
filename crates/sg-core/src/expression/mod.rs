//! Rule condition language
//!
//! Conditions are the `(...)` part of a ` @if (...)` clause:
//!
//! ```text
//! title*=i"offer" & !(host$="example.com") | path=~/\.pdf$/
//! ```
//!
//! - `lexer`: tokenizer with an explicit, rewindable cursor
//! - `parser`: recursive-descent parser producing an [`Expression`]
//! - `eval`: evaluation against a [`MatchProps`](crate::MatchProps) bag

pub mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;

pub use eval::evaluate;
pub use parser::{parse_expression, try_parse_expression, ExpressionError};

// =============================================================================
// Comparison Operators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareKind {
    /// `=`
    Equals,
    /// `^=`
    StartsWith,
    /// `$=`
    EndsWith,
    /// `*=`
    Contains,
}

impl CompareKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::StartsWith => "^=",
            Self::EndsWith => "$=",
            Self::Contains => "*=",
        }
    }
}

/// String comparison operator, optionally case-insensitive (`i` suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompareOp {
    pub kind: CompareKind,
    pub case_insensitive: bool,
}

impl CompareOp {
    pub const fn new(kind: CompareKind, case_insensitive: bool) -> Self {
        Self { kind, case_insensitive }
    }

    /// Parse operator text such as `^=` or `*=I`. `=~` is not a comparison.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_ascii_lowercase();
        let (base, case_insensitive) = match lower.strip_suffix('i') {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let kind = match base {
            "=" => CompareKind::Equals,
            "^=" => CompareKind::StartsWith,
            "$=" => CompareKind::EndsWith,
            "*=" => CompareKind::Contains,
            _ => return None,
        };
        Some(Self { kind, case_insensitive })
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.symbol())?;
        if self.case_insensitive {
            f.write_str("i")?;
        }
        Ok(())
    }
}

// =============================================================================
// Expression AST
// =============================================================================

/// Boolean condition tree. Built once while parsing a ruleset, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// `variable <op> "value"`
    Comparison {
        variable: String,
        operator: CompareOp,
        value: String,
    },
    /// `variable =~ /pattern/flags`, `variable /pattern/` or a bare `/pattern/` on `url`
    Regex {
        variable: String,
        pattern: String,
        flags: Option<String>,
    },
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn comparison(variable: impl Into<String>, operator: CompareOp, value: impl Into<String>) -> Self {
        Self::Comparison {
            variable: variable.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn regex(variable: impl Into<String>, pattern: impl Into<String>, flags: Option<&str>) -> Self {
        Self::Regex {
            variable: variable.into(),
            pattern: pattern.into(),
            flags: flags.filter(|f| !f.is_empty()).map(str::to_string),
        }
    }

    pub fn not(inner: Expression) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Visit every regex test in the tree.
    pub fn for_each_regex<'a>(&'a self, f: &mut impl FnMut(&'a str, Option<&'a str>)) {
        match self {
            Self::Comparison { .. } => {}
            Self::Regex { pattern, flags, .. } => f(pattern, flags.as_deref()),
            Self::Not(inner) => inner.for_each_regex(f),
            Self::And(left, right) | Self::Or(left, right) => {
                left.for_each_regex(f);
                right.for_each_regex(f);
            }
        }
    }

    fn is_atom(&self) -> bool {
        matches!(self, Self::Comparison { .. } | Self::Regex { .. })
    }
}

/// Renders the expression back into condition syntax; the output parses to
/// an identical tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison { variable, operator, value } => {
                write!(f, "{variable}{operator}\"")?;
                for ch in value.chars() {
                    if ch == '"' || ch == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{ch}")?;
                }
                f.write_str("\"")
            }
            Self::Regex { variable, pattern, flags } => {
                write!(f, "{variable}=~/{pattern}/{}", flags.as_deref().unwrap_or(""))
            }
            Self::Not(inner) if inner.is_atom() || matches!(**inner, Self::Not(_)) => {
                write!(f, "!{inner}")
            }
            Self::Not(inner) => write!(f, "!({inner})"),
            Self::And(left, right) => {
                write_operand(f, left, |e| matches!(e, Self::Or(..)))?;
                f.write_str(" & ")?;
                write_operand(f, right, |e| matches!(e, Self::Or(..) | Self::And(..)))
            }
            Self::Or(left, right) => {
                write_operand(f, left, |_| false)?;
                f.write_str(" | ")?;
                write_operand(f, right, |e| matches!(e, Self::Or(..)))
            }
        }
    }
}

fn write_operand(
    f: &mut fmt::Formatter<'_>,
    expr: &Expression,
    needs_parens: impl Fn(&Expression) -> bool,
) -> fmt::Result {
    if needs_parens(expr) {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_op_parse_normalizes_case() {
        assert_eq!(CompareOp::parse("="), Some(CompareOp::new(CompareKind::Equals, false)));
        assert_eq!(CompareOp::parse("*=I"), Some(CompareOp::new(CompareKind::Contains, true)));
        assert_eq!(CompareOp::parse("=~"), None);
        assert_eq!(CompareOp::parse("=="), None);
        assert_eq!(CompareOp::new(CompareKind::Equals, true).to_string(), "=i");
    }

    #[test]
    fn display_round_trips() {
        let sources = [
            r#"title="a""#,
            r#"title*=i"quote \" and \\ slash""#,
            r#"!(a="1" | b="2")"#,
            r#"a="1" | b="2" & c="3""#,
            r#"(a="1" | b="2") & c="3""#,
            r#"a="1" & (b="2" & c="3")"#,
            r#"!!a="1""#,
            r"path=~/\.(pdf|doc)$/i",
        ];
        for source in sources {
            let parsed = parse_expression(source).expect(source);
            let rendered = parsed.to_string();
            assert_eq!(parse_expression(&rendered), Some(parsed), "{source} -> {rendered}");
        }
    }

    #[test]
    fn for_each_regex_visits_nested_tests() {
        let expr = parse_expression(r#"title=~/a/i | !(path /b/ & host="x")"#).unwrap();
        let mut seen = Vec::new();
        expr.for_each_regex(&mut |pattern, flags| seen.push((pattern, flags)));
        assert_eq!(seen, vec![("a", Some("i")), ("b", None)]);
    }
}
