//! bstatus
//!
//! Periodic status-line generator. Polls clock, CPU, memory, network, disk
//! and command sources, renders each through its format string and writes
//! the combined line to a terminal or to i3bar.
//!
//! - [`config`] - JSON5 configuration
//! - [`output`] - terminal and i3bar outputs
//! - [`build`] - turn a configuration into a running [`Program`](bstatus_framework::Program)

pub mod config;
pub mod output;
mod setup;

pub use config::{BstatusConfig, OutputConfig, SourceConfig, SourceKindConfig};
pub use setup::{StatusLine, build, spawn_detached};
