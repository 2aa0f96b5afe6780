//! Output of a shell command.

use std::time::Duration;

use bstatus_framework::{SampleError, Sampler};

use crate::exec::shell;

/// Default update period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Runs a command through `sh -c` and uses its trimmed standard output as
/// markup. A non-zero exit status is a sampling failure carrying stderr.
#[derive(Debug, Clone)]
pub struct Command {
    command: String,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Sampler for Command {
    async fn sample(&mut self) -> Result<Option<String>, SampleError> {
        tracing::trace!(command = %self.command, "Running command");
        shell(&self.command).await.map(Some)
    }
}
