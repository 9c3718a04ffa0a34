//! Condition evaluation

use log::trace;

use super::{CompareKind, Expression};
use crate::regexp::RegexLiteral;
use crate::types::MatchProps;

/// Evaluate a condition against a property bag.
///
/// Missing properties and regexes that fail to compile evaluate to `false`.
pub fn evaluate(expr: &Expression, props: &MatchProps) -> bool {
    match expr {
        Expression::Comparison { variable, operator, value } => {
            let Some(actual) = props.get(variable) else {
                return false;
            };
            if operator.case_insensitive {
                compare(operator.kind, &actual.to_lowercase(), &value.to_lowercase())
            } else {
                compare(operator.kind, actual, value)
            }
        }
        Expression::Regex { variable, pattern, flags } => {
            let Some(actual) = props.get(variable) else {
                return false;
            };
            let literal = RegexLiteral::new(pattern, flags.as_deref().unwrap_or(""));
            match literal.compile() {
                Ok(re) => re.is_match(actual),
                Err(e) => {
                    trace!("condition regex /{}/ does not compile: {}", pattern, e);
                    false
                }
            }
        }
        Expression::Not(inner) => !evaluate(inner, props),
        Expression::And(left, right) => evaluate(left, props) && evaluate(right, props),
        Expression::Or(left, right) => evaluate(left, props) || evaluate(right, props),
    }
}

#[inline]
fn compare(kind: CompareKind, actual: &str, expected: &str) -> bool {
    match kind {
        CompareKind::Equals => actual == expected,
        CompareKind::StartsWith => actual.starts_with(expected),
        CompareKind::EndsWith => actual.ends_with(expected),
        CompareKind::Contains => actual.contains(expected),
    }
}
