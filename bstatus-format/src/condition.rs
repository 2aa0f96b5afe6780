//! Conditional clauses: `<op><number><unit>?(<text>)`.
//!
//! A clause renders `text` verbatim when the runtime value satisfies the
//! comparison and renders nothing otherwise. The unit suffix scales the
//! threshold by powers of 1000 (`K` = 1e3 up to `Y` = 1e24).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::template::Expansion;

/// Regex fragment for a clause, with named groups `op`, `threshold`, `unit`
/// and `text`. Metric grammars append it to their field patterns.
pub const CONDITION_PATTERN: &str =
    r"(?P<op><=|>=|!=|==?|<|>)(?P<threshold>\d+(?:\.\d+)?)(?P<unit>[KMGTPEZY])?\((?P<text>(?:[^\\)]|\\.)*)\)";

static CLAUSE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}$", CONDITION_PATTERN)).unwrap());

/// Comparison operator of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// Parse an operator; `=` and `==` both mean equality.
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" | "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Eq => value == threshold,
            Self::Ne => value != threshold,
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
            Self::Gt => value > threshold,
            Self::Ge => value >= threshold,
        }
    }
}

/// A compiled conditional clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub comparison: Comparison,
    pub threshold: f64,
    pub text: String,
}

impl Condition {
    /// Build from captures of a pattern containing [`CONDITION_PATTERN`].
    pub fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let comparison = Comparison::parse(caps.name("op")?.as_str())?;
        let mut threshold: f64 = caps.name("threshold")?.as_str().parse().ok()?;
        if let Some(unit) = caps.name("unit") {
            threshold *= unit_multiplier(unit.as_str().chars().next()?)?;
        }
        let text = caps.name("text").map_or("", |m| m.as_str()).to_string();
        Some(Self {
            comparison,
            threshold,
            text,
        })
    }

    /// Parse a standalone clause such as `>=2K(busy)`.
    pub fn parse(clause: &str) -> Option<Self> {
        CLAUSE_REGEX
            .captures(clause)
            .and_then(|caps| Self::from_captures(&caps))
    }

    /// The clause text if `value` satisfies the comparison, else `""`.
    pub fn evaluate(&self, value: f64) -> &str {
        if self.comparison.holds(value, self.threshold) {
            &self.text
        } else {
            ""
        }
    }
}

/// Threshold multiplier for a unit suffix.
pub fn unit_multiplier(unit: char) -> Option<f64> {
    let power = match unit {
        'K' => 1,
        'M' => 2,
        'G' => 3,
        'T' => 4,
        'P' => 5,
        'E' => 6,
        'Z' => 7,
        'Y' => 8,
        _ => return None,
    };
    Some(1000f64.powi(power))
}

/// Compile a conditional token whose value is read by `value`.
///
/// Falls back to the matched text as a literal if the clause is malformed.
pub fn conditional<S, F>(caps: &Captures<'_>, value: F) -> Expansion<S>
where
    F: Fn(&S) -> f64 + Send + Sync + 'static,
{
    match Condition::from_captures(caps) {
        Some(condition) => {
            Expansion::evaluator(move |snapshot: &S| condition.evaluate(value(snapshot)).to_string())
        }
        None => Expansion::Literal(caps.get(0).map_or("", |m| m.as_str()).to_string()),
    }
}
