//! Color specs used by rich-text markup.
//!
//! A color is written in markup as `{rgb}` or `{rrggbb}` (hex digits). The
//! same spec is rendered as an `#rrggbb` string for i3bar/pango and mapped to
//! the nearest 3-bit SGR color for terminals.

use std::fmt;
use std::str::FromStr;

use crate::error::MarkupError;

/// Hex digits of the color used for error text.
pub const ERROR_COLOR: &str = "f00";

/// A validated 3- or 6-hex-digit color spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    /// Parse a color spec without the surrounding braces.
    pub fn parse(spec: &str) -> Result<Self, MarkupError> {
        let valid = matches!(spec.len(), 3 | 6) && spec.chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(MarkupError::InvalidColor(spec.to_string()));
        }
        Ok(Self(spec.to_string()))
    }

    /// The alert color used by `Source::set_error`.
    pub fn alert() -> Self {
        Self(ERROR_COLOR.to_string())
    }

    /// The hex digits as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Red, green and blue components normalized to `0.0..=1.0`.
    pub fn components(&self) -> [f64; 3] {
        let (width, denom) = if self.0.len() > 3 { (2, 255.0) } else { (1, 15.0) };
        let mut out = [0.0; 3];
        for (i, comp) in out.iter_mut().enumerate() {
            let digits = &self.0[i * width..i * width + width];
            // Validated in `parse`.
            let value = u8::from_str_radix(digits, 16).unwrap_or(0);
            *comp = f64::from(value) / denom;
        }
        out
    }

    /// Nearest 3-bit terminal foreground color (SGR 30-37).
    ///
    /// Each component above one half sets its bit: red = 1, green = 2, blue = 4.
    pub fn ansi_code(&self) -> u8 {
        self.components()
            .iter()
            .enumerate()
            .filter(|(_, comp)| **comp > 0.5)
            .fold(30, |code, (i, _)| code + (1 << i))
    }

    /// The color as `#rrggbb`, expanding the short form.
    pub fn to_hex6(&self) -> String {
        if self.0.len() == 6 {
            return format!("#{}", self.0);
        }
        let mut out = String::with_capacity(7);
        out.push('#');
        for c in self.0.chars() {
            out.push(c);
            out.push(c);
        }
        out
    }
}

impl FromStr for Color {
    type Err = MarkupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
