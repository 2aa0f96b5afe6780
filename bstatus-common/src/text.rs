//! Rich-text model.
//!
//! A rendered source is an ordered list of [`Run`]s. Runs are produced from a
//! small markup language:
//!
//! | token        | meaning                                      |
//! |--------------|----------------------------------------------|
//! | `[` / `]`    | enter / leave optional mode (a toggle, not a stack) |
//! | `{rgb}`      | switch color (3 or 6 hex digits)             |
//! | `{}`         | reset color                                  |
//! | `\x`         | literal `x`                                  |
//! | `\0`         | one unit of display width, no text           |
//!
//! Markup tokens contribute no width; escapes count as one character.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::color::Color;
use crate::error::MarkupError;

/// Character used by formatters to reserve display width without text.
pub const WIDTH_PAD: char = '\0';

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)[\[\]]|\{\}|\{(?P<color>(?:[a-fA-F0-9]{3}){1,2})\}|\x00|\\.").unwrap()
});

/// A contiguous span of text sharing optionality and color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Hidden when the output is short on space.
    pub optional: bool,
    /// Foreground color, `None` for the output's default.
    pub color: Option<Color>,
    /// Literal text (escapes already resolved).
    pub text: String,
}

impl Run {
    fn same_style(&self, optional: bool, color: &Option<Color>) -> bool {
        self.optional == optional && &self.color == color
    }
}

/// Parsed markup: ordered runs plus the literal display width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    runs: Vec<Run>,
    width: usize,
}

impl RichText {
    /// Parse markup into runs.
    ///
    /// Adjacent runs with the same `(optional, color)` are merged and empty
    /// runs are dropped, so empty markup yields an empty run list.
    pub fn parse(markup: &str) -> Result<Self, MarkupError> {
        let mut out = Self::default();
        let mut optional = false;
        let mut color: Option<Color> = None;
        let mut text = String::new();
        let mut last = 0;

        for caps in TOKEN_REGEX.captures_iter(markup) {
            let Some(token) = caps.get(0) else {
                continue;
            };
            text.push_str(&markup[last..token.start()]);
            last = token.end();

            let mut next_optional = optional;
            let mut next_color = color.clone();
            match token.as_str().chars().next() {
                Some('\\') => {
                    text.extend(token.as_str().chars().skip(1));
                    continue;
                }
                Some(WIDTH_PAD) => {
                    out.width += 1;
                    continue;
                }
                Some('[') => next_optional = true,
                Some(']') => next_optional = false,
                Some('{') => {
                    next_color = caps
                        .name("color")
                        .map(|c| Color::parse(c.as_str()))
                        .transpose()?;
                }
                _ => return Err(MarkupError::UnexpectedToken(token.as_str().to_string())),
            }

            if next_optional != optional || next_color != color {
                out.push(optional, color, std::mem::take(&mut text));
                optional = next_optional;
                color = next_color;
            }
        }

        text.push_str(&markup[last..]);
        out.push(optional, color, text);
        Ok(out)
    }

    /// A single alert-colored run carrying an error description.
    pub fn error(message: impl Into<String>) -> Self {
        let mut out = Self::default();
        out.push(false, Some(Color::alert()), message.into());
        out
    }

    fn push(&mut self, optional: bool, color: Option<Color>, text: String) {
        if text.is_empty() {
            return;
        }
        self.width += text.chars().count();
        match self.runs.last_mut() {
            Some(last) if last.same_style(optional, &color) => last.text.push_str(&text),
            _ => self.runs.push(Run {
                optional,
                color,
                text,
            }),
        }
    }

    /// The runs in display order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Consume into the run list.
    pub fn into_runs(self) -> Vec<Run> {
        self.runs
    }

    /// Literal display width: run characters plus width-pad markers.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenated text of all runs, ignoring style.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Display width of markup without keeping the runs.
pub fn markup_width(markup: &str) -> Result<usize, MarkupError> {
    RichText::parse(markup).map(|text| text.width())
}
