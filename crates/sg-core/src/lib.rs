//! SiteGate Core Library
//!
//! This crate provides the rule matching engine for the SiteGate content
//! filter. Given a parsed [`Ruleset`] and a URL (optionally with metadata
//! such as the page title) it decides whether the page is blocked, allowed
//! or highlighted.
//!
//! # Architecture
//!
//! Rules are evaluated in source order and the last applicable rule wins.
//! A rule applies when its URL pattern matches and its optional `@if`
//! condition holds. Nothing here fails: malformed regexes and unparseable
//! URLs degrade to "no match" (or a permissive literal fallback).
//!
//! # Modules
//!
//! - `expression`: condition tokenizer, parser and evaluator
//! - `pattern`: URL pattern compilation and matching
//! - `regexp`: `/body/flags` regex literal support
//! - `url`: URL parsing facade
//! - `matcher`: last-match-wins resolution over a ruleset
//! - `types`: Shared type definitions
//!
//! # Examples
//!
//! ```
//! use sg_core::{is_blocked, parse_expression, MatchProps, Rule, RuleAction, Ruleset};
//!
//! let rules = vec![
//!     Rule::new(RuleAction::Block, "example.com/*", 1),
//!     Rule::new(RuleAction::Allow, "example.com/allowed/*", 2),
//!     Rule::new(RuleAction::Block, "news.com/*", 3)
//!         .with_condition(parse_expression(r#"title*=i"sponsored""#).unwrap()),
//! ];
//! let ruleset = Ruleset::new(rules, Vec::new());
//!
//! assert!(is_blocked(&ruleset, "https://example.com/page"));
//! assert!(!is_blocked(&ruleset, "https://example.com/allowed/page"));
//! assert!(is_blocked(
//!     &ruleset,
//!     MatchProps::new("https://news.com/").with_title("Sponsored post"),
//! ));
//! ```

pub mod expression;
pub mod matcher;
pub mod pattern;
pub mod regexp;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use expression::{evaluate, parse_expression, try_parse_expression, CompareKind, CompareOp, Expression, ExpressionError};
pub use matcher::{find_match, is_blocked, Matcher};
pub use pattern::{matches_pattern, CompiledPattern};
pub use regexp::{RegexError, RegexFlags, RegexLiteral};
pub use types::{MatchProps, MatchResult, Rule, RuleAction, Ruleset};
