//! SiteGate Ruleset Compiler
//!
//! This crate turns ruleset text into the [`sg_core::Ruleset`] consumed by the
//! match engine, and lints parsed rulesets for rules that will not behave as
//! written.

pub mod lint;
pub mod parser;

pub use lint::{lint_ruleset, Diagnostic, LintKind, LintReport, Severity};
pub use parser::{analyze_line, parse_rule_line, parse_ruleset, ConditionClause, LineAnalysis};
