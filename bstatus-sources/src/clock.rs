//! Local time.

use std::fmt::Write;
use std::time::Duration;

use bstatus_framework::{SampleError, Sampler};
use chrono::{DateTime, Local, TimeZone};

/// Default update period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default strftime format.
pub const DEFAULT_FORMAT: &str = "%a %d %b %H:%M:%S";

/// Renders the current local time with a strftime format.
///
/// The result is used as markup, so `[`, `]`, `{` and `\` in the format
/// keep their markup meaning.
#[derive(Debug, Clone)]
pub struct Clock {
    format: String,
}

impl Clock {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// Format `time`, failing on an unknown specifier.
    pub fn render<Tz>(&self, time: &DateTime<Tz>) -> Result<String, SampleError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut out = String::new();
        write!(out, "{}", time.format(&self.format))
            .map_err(|_| SampleError::Format(self.format.clone()))?;
        Ok(out)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT)
    }
}

impl Sampler for Clock {
    async fn sample(&mut self) -> Result<Option<String>, SampleError> {
        self.render(&Local::now()).map(Some)
    }
}
