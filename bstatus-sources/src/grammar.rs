//! Pieces shared by the metric grammars.

use bstatus_format::{CONDITION_PATTERN, DEFAULT_DENOMINATOR, Rule};
use regex::{Captures, Regex};

/// Parenthesized argument with backslash escapes, captured as `arg`.
pub(crate) const ARGUMENT: &str = r"(?:\((?P<arg>(?:[^\\)]|\\.)*)\))?";

/// `%%` renders a single `%`.
pub(crate) fn percent<S>() -> Rule<S> {
    Rule::literal(pattern("%%"), "%")
}

/// `%?<field><clause>` where `field` is a regex fragment naming the token.
pub(crate) fn condition_pattern(field: &str) -> Regex {
    pattern(&format!(r"%\?{}{}", field, CONDITION_PATTERN))
}

pub(crate) fn pattern(source: &str) -> Regex {
    Regex::new(source).unwrap()
}

/// Denominator and accuracy from the named groups, defaulting to percent
/// with no decimals.
pub(crate) fn portion_params(caps: &Captures<'_>, denom: &str, accuracy: &str) -> (u32, usize) {
    let denominator = caps
        .name(denom)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_DENOMINATOR);
    let accuracy = caps
        .name(accuracy)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    (denominator, accuracy)
}

/// The matched text of group `name`, or `""`.
pub(crate) fn group<'a>(caps: &Captures<'a>, name: &str) -> &'a str {
    caps.name(name).map_or("", |m| m.as_str())
}
