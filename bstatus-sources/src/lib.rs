//! Metric samplers for bstatus.
//!
//! Each module pairs an OS snapshot with the percent-escape grammar
//! used to render it:
//!
//! - [`clock`] - local time via strftime
//! - [`cpu`] - usage from kernel tick counters, total and per core
//! - [`memory`] - memory and swap
//! - [`network`] - interface rates and counters
//! - [`disk`] - `df` totals with mount-point lookup
//! - [`command`] - output of a shell command
//!
//! Samplers of the four OS metrics read through a [`SharedCache`] so that
//! several sources of the same kind share one query per TTL window.

pub mod clock;
pub mod command;
pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;

mod exec;
mod grammar;
mod kernel;
mod snapshot;

pub use clock::Clock;
pub use command::Command;
pub use cpu::Cpu;
pub use disk::Disk;
pub use memory::Memory;
pub use network::Network;
pub use snapshot::{SharedCache, Snapshot, SourceKind, shared_cache};
