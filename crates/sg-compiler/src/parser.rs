//! Ruleset text parser
//!
//! One rule per line:
//!
//! ```text
//! # comment
//! example.com/*                          block
//! @@example.com/allowed/*                allow
//! @1 news.example.com/*                  highlight with color 1
//! example.com/* @if (title*="offer")     any of the above plus a condition
//! ```
//!
//! Parsing never fails. A line that does not fit a special form becomes a
//! literal block pattern.

use log::{debug, warn};

use sg_core::expression::{try_parse_expression, Expression, ExpressionError};
use sg_core::types::{Rule, RuleAction, Ruleset};

const ALLOW_PREFIX: &str = "@@";
const HIGHLIGHT_PREFIX: char = '@';
const CONDITION_MARKER: &str = " @if ";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parse ruleset text into rules, keeping the source lines.
pub fn parse_ruleset(text: &str) -> Ruleset {
    let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let mut rules = Vec::new();

    for (idx, raw_line) in lines.iter().enumerate() {
        if let Some(rule) = parse_rule_line(raw_line, idx + 1) {
            rules.push(rule);
        }
    }

    debug!("parsed {} rules from {} lines", rules.len(), lines.len());
    Ruleset::new(rules, lines)
}

/// Parse a single line. Blank lines and `#` comments yield `None`.
pub fn parse_rule_line(raw_line: &str, line_number: usize) -> Option<Rule> {
    let parsed = analyze_line(raw_line)?;

    let condition = match parsed.condition {
        ConditionClause::Absent => None,
        ConditionClause::Parsed(expr) => Some(expr),
        ConditionClause::Invalid { source, error } => {
            warn!(
                "line {}: condition ({}) does not parse: {}; rule applies unconditionally",
                line_number, source, error
            );
            None
        }
        ConditionClause::Malformed => {
            debug!("line {}: `@if` clause kept as literal pattern text", line_number);
            None
        }
    };

    Some(Rule {
        action: parsed.action,
        pattern: parsed.pattern.to_string(),
        line_number,
        highlight_color: parsed.highlight_color,
        condition,
    })
}

// =============================================================================
// Line Analysis
// =============================================================================

/// What became of a line's ` @if ` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionClause<'a> {
    /// No ` @if ` in the pattern
    Absent,
    Parsed(Expression),
    /// `@if (...)` was well-formed but the expression inside did not parse.
    /// The pattern is still truncated and the rule has no condition.
    Invalid {
        source: &'a str,
        error: ExpressionError,
    },
    /// ` @if ` was not followed by `(...)` reaching the end of the line; the
    /// text stays part of the literal pattern.
    Malformed,
}

/// A non-comment line broken into its parts, before it becomes a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAnalysis<'a> {
    pub action: RuleAction,
    pub highlight_color: Option<u64>,
    pub pattern: &'a str,
    pub condition: ConditionClause<'a>,
    /// The line started with `@` but matched neither `@@` nor `@N `
    pub unrecognized_directive: bool,
}

/// Break a line into directive, pattern and condition.
/// Blank lines and `#` comments yield `None`.
pub fn analyze_line(raw_line: &str) -> Option<LineAnalysis<'_>> {
    let line = raw_line.trim_matches(is_line_space);
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut action = RuleAction::Block;
    let mut highlight_color = None;
    let mut pattern = line;
    let mut unrecognized_directive = false;

    if let Some(rest) = line.strip_prefix(ALLOW_PREFIX) {
        action = RuleAction::Allow;
        pattern = rest.trim_matches(is_line_space);
    } else if line.starts_with(HIGHLIGHT_PREFIX) {
        match parse_highlight(line) {
            Some((color, rest)) => {
                action = RuleAction::Highlight;
                highlight_color = Some(color);
                pattern = rest;
            }
            None => unrecognized_directive = true,
        }
    }

    let (pattern, condition) = split_condition(pattern);

    Some(LineAnalysis {
        action,
        highlight_color,
        pattern,
        condition,
        unrecognized_directive,
    })
}

/// `@<digits><whitespace><rest>`. Colors too large for `u64` saturate.
fn parse_highlight(line: &str) -> Option<(u64, &str)> {
    let rest = line.strip_prefix(HIGHLIGHT_PREFIX)?;

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let (digits, after) = rest.split_at(digits_end);

    let pattern = after.trim_start_matches(is_line_space);
    if pattern.len() == after.len() || pattern.is_empty() {
        return None;
    }

    let color = digits.parse().unwrap_or(u64::MAX);
    Some((color, pattern.trim_matches(is_line_space)))
}

/// Whitespace plus the byte-order mark editors put at the start of a file.
#[inline]
fn is_line_space(c: char) -> bool {
    c.is_whitespace() || c == BYTE_ORDER_MARK
}

fn split_condition(pattern: &str) -> (&str, ConditionClause<'_>) {
    let Some(idx) = pattern.find(CONDITION_MARKER) else {
        return (pattern, ConditionClause::Absent);
    };

    let clause = pattern[idx + CONDITION_MARKER.len()..].trim();
    let Some(source) = clause
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    else {
        return (pattern, ConditionClause::Malformed);
    };
    let source = source.trim();

    let condition = match try_parse_expression(source) {
        Ok(expr) => ConditionClause::Parsed(expr),
        Err(error) => ConditionClause::Invalid { source, error },
    };
    (pattern[..idx].trim(), condition)
}
