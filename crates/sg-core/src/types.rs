//! Core type definitions for SiteGate
//!
//! A ruleset is parsed once and is read-only afterwards; everything the
//! matcher needs hangs off these types.

use std::collections::BTreeMap;
use std::fmt;

use crate::expression::Expression;

// =============================================================================
// Rule Actions
// =============================================================================

/// Action dictated by a rule, and by the match result it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleAction {
    /// Plain rule - blocks the page
    Block,
    /// Exception rule (@@...) - allows the page
    Allow,
    /// Highlight rule (@N ...) - marks the page with color N
    Highlight,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Allow => "allow",
            Self::Highlight => "highlight",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rules
// =============================================================================

/// One parsed ruleset line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub action: RuleAction,
    /// URL pattern, with any `@if` clause already stripped
    pub pattern: String,
    /// 1-based line number in the source text
    pub line_number: usize,
    /// Only set for highlight rules
    pub highlight_color: Option<u64>,
    /// Only set when the line carried a well-formed `@if (...)` clause
    pub condition: Option<Expression>,
}

impl Rule {
    /// Create an unconditional rule.
    pub fn new(action: RuleAction, pattern: impl Into<String>, line_number: usize) -> Self {
        Self {
            action,
            pattern: pattern.into(),
            line_number,
            highlight_color: None,
            condition: None,
        }
    }

    pub fn with_highlight_color(mut self, color: u64) -> Self {
        self.highlight_color = Some(color);
        self
    }

    pub fn with_condition(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Ordered collection of rules plus the text they came from.
///
/// Rule order is source order and is never changed: precedence is positional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ruleset {
    rules: Vec<Rule>,
    lines: Vec<String>,
}

impl Ruleset {
    pub fn new(rules: Vec<Rule>, lines: Vec<String>) -> Self {
        Self { rules, lines }
    }

    /// Rules in source order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Original source lines, including blanks and comments.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Source text of a 1-based line number.
    pub fn line(&self, line_number: usize) -> Option<&str> {
        line_number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Match Properties
// =============================================================================

/// Property bag a rule condition is evaluated against.
///
/// `url` is always present. `title`, `scheme`, `host` and `path` are the
/// conventional keys; any other key can be addressed from an expression.
/// Looking up an absent key yields `None`, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchProps {
    values: BTreeMap<String, String>,
}

impl MatchProps {
    pub const URL: &'static str = "url";
    pub const TITLE: &'static str = "title";
    pub const SCHEME: &'static str = "scheme";
    pub const HOST: &'static str = "host";
    pub const PATH: &'static str = "path";

    pub fn new(url: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(Self::URL.to_string(), url.into());
        Self { values }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with(Self::TITLE, title)
    }

    /// Set a property, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Set a property only if it is not already present.
    pub fn insert_if_absent(&mut self, key: &str, value: impl Into<String>) {
        if !self.values.contains_key(key) {
            self.values.insert(key.to_string(), value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn url(&self) -> &str {
        self.get(Self::URL).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<&str> for MatchProps {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for MatchProps {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

impl From<&String> for MatchProps {
    fn from(url: &String) -> Self {
        Self::new(url.as_str())
    }
}

impl From<&MatchProps> for MatchProps {
    fn from(props: &MatchProps) -> Self {
        props.clone()
    }
}

// =============================================================================
// Match Result
// =============================================================================

/// Winning rule for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub action: RuleAction,
    /// The rule that decided the outcome (borrowed from the ruleset)
    pub rule: &'a Rule,
}

impl MatchResult<'_> {
    pub fn is_blocked(&self) -> bool {
        self.action == RuleAction::Block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn props_lookup_and_absent_keys() {
        let props = MatchProps::new("https://example.com/").with_title("Hello");
        assert_eq!(props.url(), "https://example.com/");
        assert_eq!(props.get("title"), Some("Hello"));
        assert_eq!(props.get("host"), None);
    }

    #[test]
    fn insert_if_absent_keeps_caller_values() {
        let mut props = MatchProps::new("https://example.com/").with("host", "override");
        props.insert_if_absent("host", "example.com");
        props.insert_if_absent("scheme", "https");
        assert_eq!(props.get("host"), Some("override"));
        assert_eq!(props.get("scheme"), Some("https"));
    }

    #[test]
    fn ruleset_line_lookup_is_one_based() {
        let ruleset = Ruleset::new(Vec::new(), vec!["# a".into(), "b.com/*".into()]);
        assert_eq!(ruleset.line(1), Some("# a"));
        assert_eq!(ruleset.line(2), Some("b.com/*"));
        assert_eq!(ruleset.line(0), None);
        assert_eq!(ruleset.line(3), None);
    }
}
