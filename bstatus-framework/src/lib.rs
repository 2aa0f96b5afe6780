//! bstatus Framework
//!
//! Scheduling and coordination for status-line sources.
//!
//! # Overview
//!
//! This framework provides:
//! - [`Source`] holding one slot's rendered rich text and notifying one observer
//! - [`Repeat`] driving a [`Sampler`] on a clock-aligned schedule
//! - [`Program`] coalescing refresh requests into single [`Output`] renders
//!   and routing clicks back to sources
//! - [`SnapshotCache`] sharing expensive OS samples for a short TTL
//! - [`StatusConfig`] / [`StatusArgs`] / [`StatusRunner`] for startup and lifecycle
//!
//! # Example
//!
//! ```ignore
//! use bstatus_framework::{Program, Repeat, Source, StatusArgs, StatusConfig, StatusRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = StatusArgs::parse();
//!     let config = MyConfig::load(args.config_path())?;
//!     let mut runner = StatusRunner::new_with_args("bstatus", config, Some(&args))?;
//!
//!     let mut program = Program::new();
//!     let source = Arc::new(Source::new("clock"));
//!     program.add_source(source.clone());
//!     runner.track(Repeat::new(source, MySampler::default(), Duration::from_secs(1)).spawn());
//!
//!     if let Some(input) = program.set_output(Box::new(MyOutput::default()))? {
//!         runner.track(input);
//!     }
//!     runner.run(program).await?;
//!     Ok(())
//! }
//! ```

mod args;
mod cache;
mod config;
mod error;
mod output;
mod program;
mod repeat;
mod runner;
mod source;

pub use args::{StatusArgs, default_config_path};
pub use cache::{DEFAULT_TTL, SnapshotCache};
pub use config::StatusConfig;
pub use error::{Result, SampleError, StatusError};
pub use output::Output;
pub use program::{Program, ProgramEvent, ProgramHandle};
pub use repeat::{Repeat, RepeatHandle, Sampler, align_delay};
pub use runner::StatusRunner;
pub use source::{Source, SourceView, Width};

// Re-export commonly used types from bstatus-common
pub use bstatus_common::{Color, LogFormat, LoggingConfig, MarkupError, RichText, Run};
