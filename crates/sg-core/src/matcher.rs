//! Match engine
//!
//! Walks the ruleset in source order. A rule applies when its pattern
//! matches the URL and its condition (if any) holds; the last applicable
//! rule wins, whatever its action.

use log::{debug, trace};

use crate::expression::evaluate;
use crate::pattern::CompiledPattern;
use crate::types::{MatchProps, MatchResult, RuleAction, Ruleset};
use crate::url::UrlTarget;

// =============================================================================
// Matcher
// =============================================================================

/// A ruleset with every rule pattern compiled up front.
///
/// Build one when the same ruleset is matched repeatedly; results are
/// identical to [`find_match`].
pub struct Matcher<'a> {
    ruleset: &'a Ruleset,
    /// One entry per rule, same order as `ruleset.rules()`
    patterns: Vec<CompiledPattern>,
}

impl<'a> Matcher<'a> {
    /// Create a new matcher for the given ruleset.
    pub fn new(ruleset: &'a Ruleset) -> Self {
        let patterns = ruleset
            .rules()
            .iter()
            .map(|rule| {
                let compiled = CompiledPattern::compile(&rule.pattern);
                if let Some(e) = compiled.error() {
                    debug!(
                        "line {}: pattern {:?} never matches: {}",
                        rule.line_number, rule.pattern, e
                    );
                }
                compiled
            })
            .collect();

        Self { ruleset, patterns }
    }

    pub fn ruleset(&self) -> &'a Ruleset {
        self.ruleset
    }

    /// Find the rule that decides the outcome for a URL or property bag.
    pub fn find_match(&self, props: impl Into<MatchProps>) -> Option<MatchResult<'a>> {
        let (props, target) = prepare(props.into());

        let mut winner = None;
        for (rule, pattern) in self.ruleset.rules().iter().zip(&self.patterns) {
            if !pattern.matches(&target) {
                continue;
            }
            if let Some(condition) = &rule.condition {
                if !evaluate(condition, &props) {
                    continue;
                }
            }
            trace!("line {}: {} {:?} applies", rule.line_number, rule.action, rule.pattern);
            winner = Some(rule);
        }

        winner.map(|rule| MatchResult {
            action: rule.action,
            rule,
        })
    }

    /// `true` iff the deciding rule is a block rule.
    pub fn is_blocked(&self, props: impl Into<MatchProps>) -> bool {
        self.find_match(props)
            .is_some_and(|result| result.action == RuleAction::Block)
    }
}

/// Fill in `scheme`, `host` and `path` from the URL unless the caller
/// already supplied them.
fn prepare(mut props: MatchProps) -> (MatchProps, UrlTarget) {
    let target = UrlTarget::new(props.url());
    if let Some(parsed) = target.parsed() {
        props.insert_if_absent(MatchProps::SCHEME, parsed.scheme());
        props.insert_if_absent(MatchProps::HOST, parsed.hostname());
        props.insert_if_absent(MatchProps::PATH, parsed.path_and_query());
    }
    (props, target)
}

// =============================================================================
// One-shot API
// =============================================================================

/// Match a URL (or property bag) against a ruleset.
///
/// Patterns are compiled on every call; use [`Matcher`] to reuse them.
pub fn find_match(ruleset: &Ruleset, props: impl Into<MatchProps>) -> Option<MatchResult<'_>> {
    Matcher::new(ruleset).find_match(props)
}

/// `true` iff [`find_match`] returns a block rule.
pub fn is_blocked(ruleset: &Ruleset, props: impl Into<MatchProps>) -> bool {
    find_match(ruleset, props).is_some_and(|result| result.is_blocked())
}
