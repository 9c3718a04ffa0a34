//! Ruleset diagnostics
//!
//! The parser never rejects a line, so mistakes turn into rules that behave
//! differently than intended. The linter finds them. It never modifies the
//! ruleset: rule order is significant, so even duplicates are only reported.

use std::collections::HashMap;
use std::fmt;

use sg_core::expression::{Expression, ExpressionError};
use sg_core::pattern::CompiledPattern;
use sg_core::regexp::{RegexError, RegexLiteral};
use sg_core::types::{Rule, RuleAction, Ruleset};

use crate::parser::{analyze_line, ConditionClause};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LintKind {
    #[error("`@if` is not followed by `(...)` at the end of the line; it is matched as part of the pattern")]
    MalformedCondition,
    #[error("condition does not parse ({0}); the rule applies unconditionally")]
    InvalidCondition(ExpressionError),
    #[error("regex pattern never matches: {0}")]
    InvalidPattern(RegexError),
    #[error("condition regex /{pattern}/ never matches: {error}")]
    InvalidConditionRegex { pattern: String, error: RegexError },
    #[error("line starts with '@' but is neither an allow (@@) nor a highlight (@N) rule; it is a block pattern")]
    UnrecognizedDirective,
    #[error("duplicate of the rule on line {first_line}")]
    DuplicateRule { first_line: usize },
}

impl LintKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::InvalidCondition(_) | Self::InvalidPattern(_) | Self::InvalidConditionRegex { .. } => {
                Severity::Error
            }
            Self::MalformedCondition | Self::UnrecognizedDirective | Self::DuplicateRule { .. } => {
                Severity::Warning
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub line_number: usize,
    pub kind: LintKind,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line_number, self.severity(), self.kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub diagnostics: Vec<Diagnostic>,
    pub total_rules: usize,
    pub block_rules: usize,
    pub allow_rules: usize,
    pub highlight_rules: usize,
}

impl LintReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity() == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity() == severity).count()
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct RuleKey<'a> {
    action: RuleAction,
    pattern: &'a str,
    highlight_color: Option<u64>,
    condition: Option<&'a Expression>,
}

impl<'a> From<&'a Rule> for RuleKey<'a> {
    fn from(rule: &'a Rule) -> Self {
        Self {
            action: rule.action,
            pattern: &rule.pattern,
            highlight_color: rule.highlight_color,
            condition: rule.condition.as_ref(),
        }
    }
}

/// Inspect a ruleset and report suspicious rules, in rule order.
pub fn lint_ruleset(ruleset: &Ruleset) -> LintReport {
    let mut report = LintReport {
        total_rules: ruleset.len(),
        ..LintReport::default()
    };
    let mut seen: HashMap<RuleKey<'_>, usize> = HashMap::new();

    for rule in ruleset.rules() {
        match rule.action {
            RuleAction::Block => report.block_rules += 1,
            RuleAction::Allow => report.allow_rules += 1,
            RuleAction::Highlight => report.highlight_rules += 1,
        }

        let mut push = |kind: LintKind| {
            report.diagnostics.push(Diagnostic {
                line_number: rule.line_number,
                kind,
            })
        };

        // Source-level checks need the original line; rulesets built in code
        // may not carry one.
        if let Some(parsed) = ruleset.line(rule.line_number).and_then(analyze_line) {
            if parsed.unrecognized_directive {
                push(LintKind::UnrecognizedDirective);
            }
            match parsed.condition {
                ConditionClause::Invalid { error, .. } => push(LintKind::InvalidCondition(error)),
                ConditionClause::Malformed => push(LintKind::MalformedCondition),
                ConditionClause::Absent | ConditionClause::Parsed(_) => {}
            }
        } else if rule.pattern.contains(" @if ") {
            push(LintKind::MalformedCondition);
        }

        if let Some(error) = CompiledPattern::compile(&rule.pattern).error() {
            push(LintKind::InvalidPattern(error.clone()));
        }

        if let Some(condition) = &rule.condition {
            condition.for_each_regex(&mut |pattern, flags| {
                if let Err(error) = RegexLiteral::new(pattern, flags.unwrap_or("")).compile() {
                    push(LintKind::InvalidConditionRegex {
                        pattern: pattern.to_string(),
                        error,
                    });
                }
            });
        }

        match seen.get(&RuleKey::from(rule)) {
            Some(&first_line) => push(LintKind::DuplicateRule { first_line }),
            None => {
                seen.insert(RuleKey::from(rule), rule.line_number);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_ruleset;

    fn kinds(report: &LintReport) -> Vec<(usize, String)> {
        report
            .diagnostics
            .iter()
            .map(|d| (d.line_number, format!("{:?}", d.kind)))
            .collect()
    }

    #[test]
    fn clean_ruleset_has_no_diagnostics() {
        let ruleset = parse_ruleset("# rules\nexample.com/*\n@@example.com/ok/*\n@1 news.com/* @if (title*=\"x\")");
        let report = lint_ruleset(&ruleset);
        assert!(report.diagnostics.is_empty(), "{:?}", kinds(&report));
        assert_eq!(report.total_rules, 3);
        assert_eq!(report.block_rules, 1);
        assert_eq!(report.allow_rules, 1);
        assert_eq!(report.highlight_rules, 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn reports_condition_problems() {
        let ruleset = parse_ruleset("a.com/* @if title=\"x\"\nb.com/* @if (title=x)");
        let report = lint_ruleset(&ruleset);

        assert_eq!(report.diagnostics.len(), 2);
        assert!(matches!(report.diagnostics[0].kind, LintKind::MalformedCondition));
        assert_eq!(report.diagnostics[0].line_number, 1);
        assert!(matches!(
            report.diagnostics[1].kind,
            LintKind::InvalidCondition(ExpressionError::UnexpectedToken { .. })
        ));
        assert_eq!(report.diagnostics[1].line_number, 2);
        assert!(report.has_errors());
        assert_eq!(report.count(Severity::Error), 1);
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[test]
    fn reports_bad_regexes() {
        let ruleset = parse_ruleset("/(/\n*://*/* @if (title=~/a(?=b)/)");
        let report = lint_ruleset(&ruleset);

        assert_eq!(report.diagnostics.len(), 2);
        assert!(matches!(report.diagnostics[0].kind, LintKind::InvalidPattern(_)));
        match &report.diagnostics[1].kind {
            LintKind::InvalidConditionRegex { pattern, .. } => assert_eq!(pattern, "a(?=b)"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reports_unrecognized_directive() {
        let report = lint_ruleset(&parse_ruleset("@abc foo.com/*"));
        assert_eq!(report.diagnostics.len(), 1);
        assert!(matches!(report.diagnostics[0].kind, LintKind::UnrecognizedDirective));
        assert_eq!(report.block_rules, 1);
    }

    #[test]
    fn reports_duplicates_without_removing_them() {
        let ruleset = parse_ruleset("a.com/*\n@@a.com/*\n\na.com/*\n@1 a.com/*\n@2 a.com/*");
        let report = lint_ruleset(&ruleset);

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].line_number, 4);
        assert!(matches!(
            report.diagnostics[0].kind,
            LintKind::DuplicateRule { first_line: 1 }
        ));
        assert_eq!(ruleset.len(), 5);
    }

    #[test]
    fn works_without_source_lines() {
        let ruleset = Ruleset::new(
            vec![Rule::new(RuleAction::Block, "a.com/* @if title=\"x\"", 1)],
            Vec::new(),
        );
        let report = lint_ruleset(&ruleset);
        assert!(matches!(report.diagnostics[0].kind, LintKind::MalformedCondition));
    }

    #[test]
    fn diagnostic_display() {
        let report = lint_ruleset(&parse_ruleset("\n/(/"));
        let text = report.diagnostics[0].to_string();
        assert!(text.starts_with("line 2: error: regex pattern never matches"), "{text}");
    }
}
