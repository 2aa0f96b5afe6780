//! Format-string compilation for bstatus sources.
//!
//! Every metric source owns a small percent-escape grammar. A grammar is an
//! ordered list of [`Rule`]s; [`compile`] turns a user format string into a
//! [`Template`] once, and the template is then rendered against a fresh
//! snapshot on every tick.
//!
//! - [`template`] - rules, expansions and the compiler
//! - [`units`] - portion, size and speed formatting with width padding
//! - [`condition`] - `<op><number><unit>(<text>)` conditional clauses
//!
//! # Example
//!
//! ```ignore
//! use bstatus_format::{Expansion, Rule, compile};
//! use regex::Regex;
//!
//! let rules = vec![
//!     Rule::literal(Regex::new("%%").unwrap(), "%"),
//!     Rule::evaluator(Regex::new("%v").unwrap(), |_| {
//!         Expansion::evaluator(|value: &u32| value.to_string())
//!     }),
//! ];
//! let template = compile(&rules, "load %v%%");
//! assert_eq!(template.render(&7), "load 7%");
//! ```

pub mod condition;
pub mod template;
pub mod units;

pub use condition::{CONDITION_PATTERN, Comparison, Condition, conditional};
pub use template::{Evaluator, Expansion, Rule, Template, compile, unescape};
pub use units::{
    DEFAULT_DENOMINATOR, ensure_width, format_portion, format_size, format_speed,
};
