//! Render coordination.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, StatusError};
use crate::output::Output;
use crate::source::{Source, SourceView};

/// Messages handled by [`Program::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramEvent {
    /// Re-render soon. Carries the index of the source that changed, if any.
    Refresh(Option<usize>),
    /// A click on the source at `index`.
    Click { index: usize, button: u8 },
}

/// Cloneable sender of [`ProgramEvent`]s.
#[derive(Clone, Debug)]
pub struct ProgramHandle {
    tx: mpsc::UnboundedSender<ProgramEvent>,
}

impl ProgramHandle {
    pub fn refresh(&self) {
        self.send(ProgramEvent::Refresh(None));
    }

    pub fn click(&self, index: usize, button: u8) {
        self.send(ProgramEvent::Click { index, button });
    }

    pub fn send(&self, event: ProgramEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!(?event, "Program stopped, event dropped");
        }
    }
}

/// Owns the ordered sources and the output.
///
/// Change notifications from any source become refresh requests; requests
/// that arrive within the defer window collapse into a single render of
/// every source's current state.
pub struct Program {
    sources: Vec<Arc<Source>>,
    output: Option<Box<dyn Output>>,
    defer: Duration,
    tx: mpsc::UnboundedSender<ProgramEvent>,
    rx: mpsc::UnboundedReceiver<ProgramEvent>,
}

impl Program {
    /// A program that renders as soon as the current burst of events has
    /// been queued.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sources: Vec::new(),
            output: None,
            defer: Duration::ZERO,
            tx,
            rx,
        }
    }

    /// Wait `defer` after the first refresh request before rendering.
    pub fn with_defer_timeout(mut self, defer: Duration) -> Self {
        self.defer = defer;
        self
    }

    /// Append a source and route its changes to refresh requests.
    ///
    /// Returns the source's display index.
    pub fn add_source(&mut self, source: Arc<Source>) -> usize {
        let index = self.sources.len();
        let handle = self.handle();
        source.attach(move || handle.send(ProgramEvent::Refresh(Some(index))));
        tracing::debug!(source = %source.name(), index, "Added source");
        self.sources.push(source);
        index
    }

    /// Attach the output and render immediately.
    ///
    /// Returns the output's input task, if it started one, so the caller can
    /// stop it on shutdown.
    pub fn set_output(&mut self, mut output: Box<dyn Output>) -> Result<Option<JoinHandle<()>>> {
        let input = output.attach(self.handle());
        self.output = Some(output);
        if let Err(e) = self.render() {
            if let Some(task) = &input {
                task.abort();
            }
            return Err(e);
        }
        Ok(input)
    }

    pub fn handle(&self) -> ProgramHandle {
        ProgramHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn sources(&self) -> &[Arc<Source>] {
        &self.sources
    }

    /// Request a coalesced render.
    pub fn refresh(&self) {
        self.handle().refresh();
    }

    /// Deliver a click to the source at `index`.
    pub fn click(&self, index: usize, button: u8) -> Result<()> {
        let source = self
            .sources
            .get(index)
            .ok_or(StatusError::UnknownSource(index))?;
        source.click(button);
        Ok(())
    }

    /// Render every source now, bypassing the defer window.
    pub fn render(&mut self) -> Result<()> {
        let Some(output) = self.output.as_mut() else {
            return Ok(());
        };
        let views: Vec<SourceView> = self.sources.iter().map(|s| s.view()).collect();
        output.display(&views)
    }

    /// Process events until the output fails.
    pub async fn run(mut self) -> Result<()> {
        tracing::debug!(sources = self.sources.len(), defer = ?self.defer, "Program running");

        while let Some(event) = self.rx.recv().await {
            match event {
                ProgramEvent::Refresh(origin) => {
                    tracing::trace!(?origin, "Refresh requested");
                    let clicks = self.coalesce().await;
                    self.render()?;
                    for (index, button) in clicks {
                        self.dispatch_click(index, button);
                    }
                }
                ProgramEvent::Click { index, button } => self.dispatch_click(index, button),
            }
        }

        Ok(())
    }

    // Wait out the defer window and swallow refresh requests queued during
    // it. Clicks are kept in arrival order.
    async fn coalesce(&mut self) -> Vec<(usize, u8)> {
        if self.defer.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.defer).await;
        }

        let mut clicks = Vec::new();
        let mut merged = 0usize;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                ProgramEvent::Refresh(_) => merged += 1,
                ProgramEvent::Click { index, button } => clicks.push((index, button)),
            }
        }
        if merged > 0 {
            tracing::trace!(merged, "Coalesced refresh requests");
        }
        clicks
    }

    fn dispatch_click(&self, index: usize, button: u8) {
        if let Err(e) = self.click(index, button) {
            tracing::warn!(error = %e, button, "Ignoring click");
        }
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_source_indices() {
        let mut program = Program::new();
        assert_eq!(program.add_source(Arc::new(Source::new("a"))), 0);
        assert_eq!(program.add_source(Arc::new(Source::new("b"))), 1);
        assert_eq!(program.sources().len(), 2);
    }

    #[test]
    fn test_click_out_of_range() {
        let program = Program::new();
        assert!(matches!(
            program.click(3, 1),
            Err(StatusError::UnknownSource(3))
        ));
    }

    #[test]
    fn test_source_change_queues_refresh() {
        let mut program = Program::new();
        let source = Arc::new(Source::new("a"));
        program.add_source(Arc::new(Source::new("first")));
        program.add_source(source.clone());

        source.set_text("x").unwrap();
        assert_eq!(program.rx.try_recv(), Ok(ProgramEvent::Refresh(Some(1))));
    }

    #[test]
    fn test_render_without_output() {
        let mut program = Program::new();
        program.add_source(Arc::new(Source::new("a")));
        assert!(program.render().is_ok());
    }
}
