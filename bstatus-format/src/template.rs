//! Rules, expansions and the format-string compiler.

use std::fmt;

use regex::{Captures, Regex};
use tracing::trace;

/// Renders one token against a snapshot.
pub type Evaluator<S> = Box<dyn Fn(&S) -> String + Send + Sync>;

type Factory<S> = Box<dyn Fn(&Captures<'_>) -> Expansion<S> + Send + Sync>;

/// What a matched token compiles to.
pub enum Expansion<S> {
    /// Fixed text, resolved once at compile time.
    Literal(String),
    /// A per-snapshot evaluator with its parameters already captured.
    Evaluator(Evaluator<S>),
}

impl<S> Expansion<S> {
    /// Wrap a closure as an evaluator expansion.
    pub fn evaluator<F>(f: F) -> Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        Self::Evaluator(Box::new(f))
    }
}

enum Handler<S> {
    Literal(String),
    Factory(Factory<S>),
}

/// A token pattern and what it compiles to.
pub struct Rule<S> {
    pattern: Regex,
    handler: Handler<S>,
}

impl<S> Rule<S> {
    /// A token that always compiles to the same text (e.g. `%%` to `%`).
    pub fn literal(pattern: Regex, text: impl Into<String>) -> Self {
        Self {
            pattern,
            handler: Handler::Literal(text.into()),
        }
    }

    /// A token whose captures are turned into an [`Expansion`] at compile time.
    ///
    /// Width, accuracy and location parameters must be read from the
    /// captures here and moved into the returned evaluator.
    pub fn evaluator<F>(pattern: Regex, factory: F) -> Self
    where
        F: Fn(&Captures<'_>) -> Expansion<S> + Send + Sync + 'static,
    {
        Self {
            pattern,
            handler: Handler::Factory(Box::new(factory)),
        }
    }

    fn expand(&self, caps: &Captures<'_>) -> Expansion<S> {
        match &self.handler {
            Handler::Literal(text) => Expansion::Literal(text.clone()),
            Handler::Factory(factory) => factory(caps),
        }
    }
}

impl<S> fmt::Debug for Rule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// A compiled format string.
///
/// Immutable once built; rendering only runs the captured evaluators.
pub struct Template<S> {
    segments: Vec<(String, Evaluator<S>)>,
    suffix: String,
}

impl<S> Template<S> {
    /// Compile `source` against an ordered rule set.
    ///
    /// The earliest match in the unconsumed text wins; on equal start offsets
    /// the rule declared first wins. Text matched by no rule, including stray
    /// `%` sequences, is kept as literal text.
    pub fn compile(rules: &[Rule<S>], source: &str) -> Self {
        let mut next: Vec<Option<Captures<'_>>> = rules
            .iter()
            .map(|rule| find_from(&rule.pattern, source, 0))
            .collect();
        let mut segments = Vec::new();
        let mut prefix = String::new();
        let mut start = 0;

        loop {
            let best = next
                .iter()
                .enumerate()
                .filter_map(|(i, caps)| caps.as_ref().and_then(|c| c.get(0)).map(|m| (m.start(), i)))
                .min();
            let Some((_, index)) = best else {
                break;
            };
            let Some(caps) = next[index].take() else {
                break;
            };
            let Some(token) = caps.get(0) else {
                break;
            };

            prefix.push_str(&source[start..token.start()]);
            start = token.end();

            match rules[index].expand(&caps) {
                Expansion::Literal(text) => prefix.push_str(&text),
                Expansion::Evaluator(evaluator) => {
                    segments.push((std::mem::take(&mut prefix), evaluator));
                }
            }

            // Re-scan rules whose pending match overlaps consumed text.
            for (i, (slot, rule)) in next.iter_mut().zip(rules).enumerate() {
                let stale = match slot {
                    None => i == index,
                    Some(caps) => caps.get(0).is_none_or(|m| m.start() < start),
                };
                if stale {
                    *slot = find_from(&rule.pattern, source, start);
                }
            }
        }

        prefix.push_str(&source[start..]);
        trace!(source, segments = segments.len(), "Compiled format string");

        Self {
            segments,
            suffix: prefix,
        }
    }

    /// Render against a snapshot.
    pub fn render(&self, snapshot: &S) -> String {
        let mut out = String::new();
        for (prefix, evaluator) in &self.segments {
            out.push_str(prefix);
            out.push_str(&evaluator(snapshot));
        }
        out.push_str(&self.suffix);
        out
    }

    /// Number of evaluator segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Literal text after the last evaluator.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl<S> fmt::Debug for Template<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes: Vec<&str> = self.segments.iter().map(|(p, _)| p.as_str()).collect();
        f.debug_struct("Template")
            .field("prefixes", &prefixes)
            .field("suffix", &self.suffix)
            .finish()
    }
}

/// Compile a format string; see [`Template::compile`].
pub fn compile<S>(rules: &[Rule<S>], source: &str) -> Template<S> {
    Template::compile(rules, source)
}

/// Next non-empty match of `pattern` at or after byte offset `at`.
fn find_from<'a>(pattern: &Regex, source: &'a str, mut at: usize) -> Option<Captures<'a>> {
    loop {
        let caps = pattern.captures_at(source, at)?;
        let token = caps.get(0)?;
        if !token.is_empty() {
            return Some(caps);
        }
        let step = source[token.start()..].chars().next()?.len_utf8();
        at = token.start() + step;
    }
}

/// Collapse backslash escapes (`\x` becomes `x`) in a captured argument.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}
