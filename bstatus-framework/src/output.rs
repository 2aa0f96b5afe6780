//! Render targets.

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::program::ProgramHandle;
use crate::source::SourceView;

/// Destination for the combined status line.
///
/// `display` receives every source's state in display order each time the
/// [`Program`](crate::Program) renders.
pub trait Output: Send {
    /// Called once by [`Program::set_output`](crate::Program::set_output)
    /// before the first render. Outputs that receive input (clicks) keep the
    /// handle to feed events back and return the task reading that input.
    fn attach(&mut self, _program: ProgramHandle) -> Option<JoinHandle<()>> {
        None
    }

    /// Write one full status line.
    fn display(&mut self, sources: &[SourceView]) -> Result<()>;
}
