use thiserror::Error;

/// Common error type for bstatus components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Errors raised while parsing rich-text markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// The tokenizer produced a token the parser has no rule for.
    #[error("Internal error, bad markup token: {0:?}")]
    UnexpectedToken(String),

    /// A color spec that is neither 3 nor 6 hex digits.
    #[error("Invalid color spec: {0:?}")]
    InvalidColor(String),
}

/// Result type alias using bstatus's Error.
pub type Result<T> = std::result::Result<T, Error>;
