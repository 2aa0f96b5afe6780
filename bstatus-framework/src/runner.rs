//! Status-line lifecycle management.

use tokio::signal;
use tokio::task::JoinHandle;

use bstatus_common::{LoggingConfig, init_tracing};

use crate::StatusArgs;
use crate::config::StatusConfig;
use crate::error::{Result, StatusError};
use crate::program::Program;

/// Runner that manages the lifecycle of the status line.
///
/// Handles:
/// - Logging initialization
/// - Tracking driver tasks so they are aborted on exit
/// - Running the [`Program`] until it fails or Ctrl+C arrives
///
/// # Example
///
/// ```ignore
/// use bstatus_framework::{StatusArgs, StatusConfig, StatusRunner};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let args = StatusArgs::parse();
///     let config = MyConfig::load(args.config_path())?;
///
///     let mut runner = StatusRunner::new_with_args("bstatus", config, Some(&args))?;
///     let program = build_program(runner.config(), &mut runner)?;
///
///     runner.run(program).await?;
///     Ok(())
/// }
/// ```
pub struct StatusRunner<C: StatusConfig> {
    name: String,
    version: String,
    config: C,
    tasks: Vec<JoinHandle<()>>,
}

impl<C: StatusConfig> StatusRunner<C> {
    /// Create a runner, initializing logging from the configuration.
    pub fn new(name: impl Into<String>, config: C) -> Result<Self> {
        Self::new_with_args(name, config, None)
    }

    /// Create a runner with CLI args for log level override.
    pub fn new_with_args(
        name: impl Into<String>,
        config: C,
        args: Option<&StatusArgs>,
    ) -> Result<Self> {
        let name = name.into();
        let version = env!("CARGO_PKG_VERSION").to_string();

        let log_config = match args.and_then(|a| a.log_level.as_ref()) {
            Some(level) => LoggingConfig {
                level: level.clone(),
                ..config.logging().clone()
            },
            None => config.logging().clone(),
        };

        init_tracing(&log_config).map_err(|e| StatusError::config(e.to_string()))?;

        tracing::info!(name = %name, version = %version, "Starting status line");

        Ok(Self {
            name,
            version,
            config,
            tasks: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Track an already spawned task.
    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.tasks.push(handle);
    }

    /// Run `program` until its output fails or Ctrl+C is received.
    ///
    /// All tracked tasks are aborted before returning. An output failure is
    /// returned as the error.
    pub async fn run(self, program: Program) -> Result<()> {
        tracing::info!(
            name = %self.name,
            sources = program.sources().len(),
            tasks = self.tasks.len(),
            "Status line running"
        );

        let result = tokio::select! {
            result = program.run() => result,
            signal = signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
                tracing::info!(name = %self.name, "Received shutdown signal");
                Ok(())
            }
        };

        for task in &self.tasks {
            task.abort();
        }

        if let Err(ref e) = result {
            tracing::error!(error = %e, "Program stopped");
        }
        tracing::info!(name = %self.name, "Goodbye!");

        result
    }
}
